// Tables owned by the embedded migrations, plus the SQLite catalog.

diesel::table! {
    resource_registry (id) {
        id -> Integer,
        name -> Text,
        type_id -> Integer,
        target_table -> Text,
        api_function -> Nullable<Text>,
        api_interval -> Nullable<Text>,
        api_endpoint -> Text,
        create_table_sql -> Text,
        merge_sql -> Nullable<Text>,
        is_active -> Integer,
    }
}

diesel::table! {
    currency_pairs (id) {
        id -> Integer,
        base_currency -> Nullable<Text>,
        quote_currency -> Nullable<Text>,
    }
}

diesel::table! {
    staging_news_sentiment (id) {
        id -> Integer,
        published_at -> Text,
        ticker -> Text,
        topics -> Text,
        sentiment_score -> Double,
        sentiment_label -> Text,
        relevance_score -> Double,
        source -> Nullable<Text>,
        article_url -> Nullable<Text>,
        summary -> Nullable<Text>,
    }
}

diesel::table! {
    /// Read-only view of the SQLite object catalog.
    sqlite_master (name) {
        #[sql_name = "type"]
        object_type -> Text,
        name -> Text,
        tbl_name -> Text,
        sql -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(resource_registry, currency_pairs, staging_news_sentiment,);
