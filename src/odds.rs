/// Convert one bookmaker quote into an implied probability.
///
/// Quotes are odds-against. Fractional `n/d` maps to `d / (n + d)`, a bare
/// number `v` ("v to 1") maps to `1 / (v + 1)` and "evens" is `1/1`. Anything
/// that does not parse comes back as `None`; this never fails loudly.
pub fn parse_odds(raw: &str) -> Option<f64> {
    let quote = raw.trim();
    if quote.is_empty() {
        return None;
    }
    if is_evens(quote) {
        return Some(0.5);
    }

    let prob = match quote.split_once('/') {
        Some((num, den)) => {
            if den.contains('/') {
                return None;
            }
            let num = positive_number(num)?;
            let den = positive_number(den)?;
            den / (num + den)
        }
        None => {
            let against = positive_number(quote)?;
            1.0 / (against + 1.0)
        }
    };
    // extreme magnitudes overflow or round to the bounds
    Some(prob).filter(|p| *p > 0.0 && *p < 1.0)
}

fn is_evens(quote: &str) -> bool {
    matches!(
        quote.to_ascii_lowercase().as_str(),
        "evens" | "evs" | "even" | "evn"
    )
}

fn positive_number(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    if v.is_finite() && v > 0.0 { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::parse_odds;

    #[test]
    fn known_quotes() {
        assert_eq!(parse_odds("1/4"), Some(0.80));
        assert_eq!(parse_odds("1/3"), Some(0.75));
        assert_eq!(parse_odds("9/1"), Some(0.10));
        assert_eq!(parse_odds("9"), Some(0.10));
        assert_eq!(parse_odds("1"), Some(0.50));
    }

    #[test]
    fn fractional_uses_denominator_over_total() {
        for (n, d) in [(2u32, 1u32), (5, 2), (11, 4), (1, 100), (250, 1)] {
            let p = parse_odds(&format!("{n}/{d}")).expect("valid fraction");
            let expected = d as f64 / (n as f64 + d as f64);
            assert_eq!(p, expected);
            assert!(p > 0.0 && p < 1.0);
        }
    }

    #[test]
    fn fraction_and_decimal_agree() {
        assert_eq!(parse_odds("5/1"), parse_odds("5"));
        assert_eq!(parse_odds("3/2"), parse_odds("1.5"));
    }

    #[test]
    fn decimal_is_strictly_decreasing() {
        let values = [0.001, 0.5, 1.0, 2.0, 9.0, 100.0, 1e6];
        let probs: Vec<f64> = values
            .iter()
            .map(|v| parse_odds(&v.to_string()).expect("valid decimal"))
            .collect();
        assert!(probs.windows(2).all(|w| w[0] > w[1]));
        assert!(probs[0] > 0.99);
        assert!(probs[probs.len() - 1] < 1e-5);
    }

    #[test]
    fn evens_and_whitespace() {
        assert_eq!(parse_odds("Evens"), Some(0.5));
        assert_eq!(parse_odds("EVS"), Some(0.5));
        assert_eq!(parse_odds(" 7 / 2 "), Some(2.0 / 9.0));
    }

    #[test]
    fn malformed_quotes_are_missing() {
        for raw in ["", "   ", "abc", "1/0", "0/1", "0", "-3", "1/2/3", "/4", "4/", "SP", "inf", "NaN"] {
            assert_eq!(parse_odds(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn extreme_quotes_stay_inside_unit_interval() {
        for raw in ["1e308/1e308", "1/1e308", "1e308/1", "1e-320", "1e308"] {
            if let Some(p) = parse_odds(raw) {
                assert!(p > 0.0 && p < 1.0, "{raw:?} gave {p}");
            }
        }
        assert_eq!(parse_odds("1e308/1e308"), None);
        assert_eq!(parse_odds("1e-320"), None);
    }
}
