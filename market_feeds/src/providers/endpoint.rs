//! Endpoint template rendering.
//!
//! Registry endpoints carry `{name}` slots, e.g.
//! `https://www.alphavantage.co/query?function=FX_DAILY&from_symbol={from_symbol}&to_symbol={to_symbol}&apikey={apikey}`.

use crate::providers::{ProviderError, ValidationSnafu};

/// Fill `{name}` slots from `params`.
///
/// The template is scanned once, so substituted values are never re-read as
/// slots. Parameters the template does not mention are ignored. A slot without
/// a value, or a `{` with no closing `}`, is a [`ProviderError::Validation`],
/// so a misconfigured resource never sends a half-rendered URL upstream.
pub fn render(template: &str, params: &[(&str, &str)]) -> Result<String, ProviderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return ValidationSnafu {
                message: format!("unterminated placeholder in endpoint template {template:?}"),
            }
            .fail();
        };
        let name = &after[..close];
        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                return ValidationSnafu {
                    message: format!("unresolved placeholder {{{name}}} in endpoint template"),
                }
                .fail();
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Replace every occurrence of `secret` in `url` for logging.
pub fn redact(url: &str, secret: &str) -> String {
    if secret.is_empty() {
        url.to_string()
    } else {
        url.replace(secret, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_all_slots() {
        let url = render(
            "https://x/query?from_symbol={from_symbol}&to_symbol={to_symbol}&apikey={apikey}",
            &[("from_symbol", "USD"), ("to_symbol", "EUR"), ("apikey", "K")],
        )
        .unwrap();
        assert_eq!(url, "https://x/query?from_symbol=USD&to_symbol=EUR&apikey=K");
    }

    #[test]
    fn extra_params_are_ignored() {
        let url = render("https://x/q?apikey={apikey}", &[("apikey", "K"), ("symbol", "USDEUR")]).unwrap();
        assert_eq!(url, "https://x/q?apikey=K");
    }

    #[test]
    fn unresolved_slot_is_rejected() {
        let err = render("https://x/q?symbol={symbol}&apikey={apikey}", &[("apikey", "K")]).unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
        assert!(err.to_string().contains("{symbol}"));
    }

    #[test]
    fn braces_inside_values_are_kept_verbatim() {
        let url = render(
            "https://x/q?symbol={symbol}&apikey={apikey}",
            &[("symbol", "{apikey}"), ("apikey", "a{b}")],
        )
        .unwrap();
        assert_eq!(url, "https://x/q?symbol={apikey}&apikey=a{b}");
    }

    #[test]
    fn repeated_slot_is_filled_everywhere() {
        let url = render("https://x/{f}?function={f}", &[("f", "SMA")]).unwrap();
        assert_eq!(url, "https://x/SMA?function=SMA");
    }

    #[test]
    fn unterminated_slot_is_rejected() {
        let err = render("https://x/q?apikey={apikey", &[("apikey", "K")]).unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
    }

    #[test]
    fn redaction_hides_key() {
        assert_eq!(redact("https://x/q?apikey=SECRET", "SECRET"), "https://x/q?apikey=***");
        assert_eq!(redact("https://x/q", ""), "https://x/q");
    }
}
