use regex::Regex;
use std::sync::OnceLock;

/// Removes the `[T1234]` / `[ 1234]` customer reference the backend prepends
/// to partner names. Applied wherever a customer name is shown.
pub fn strip_id_prefix(name: &str) -> String {
    static ID_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    let pattern = ID_PREFIX_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*\[\s*T?\d+\]\s*").expect("invalid id prefix regex")
    });
    pattern.replace(name, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_t_prefixed_reference() {
        assert_eq!(strip_id_prefix("[T1234] Nguyen Van A"), "Nguyen Van A");
    }

    #[test]
    fn strips_numeric_reference_with_inner_space() {
        assert_eq!(strip_id_prefix("[ 0042]Pham Thi Mai"), "Pham Thi Mai");
    }

    #[test]
    fn strips_lowercase_t_and_leading_whitespace() {
        assert_eq!(strip_id_prefix("  [t77]  Le Thi Huong "), "Le Thi Huong");
    }

    #[test]
    fn keeps_names_without_reference() {
        assert_eq!(strip_id_prefix("Tran Van Binh"), "Tran Van Binh");
    }

    #[test]
    fn keeps_bracketed_text_that_is_not_a_reference() {
        assert_eq!(strip_id_prefix("[VIP] Tran Van Binh"), "[VIP] Tran Van Binh");
    }

    #[test]
    fn only_the_leading_reference_is_removed() {
        assert_eq!(strip_id_prefix("[T1] Anh [T2]"), "Anh [T2]");
    }
}
