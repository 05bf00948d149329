pub mod currency_pair;
pub mod feed_kind;
pub mod news;
pub mod record;
pub mod resource;
pub mod watermark;
