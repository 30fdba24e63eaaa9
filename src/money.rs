/// Rupee sign used in front of every amount.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Format a whole-rupee amount with en-IN grouping: the last three digits,
/// then groups of two (`1,50,000`).
pub fn format_inr(amount: u64) -> String {
    format!("{}{}", CURRENCY_SYMBOL, group_indian(amount))
}

fn group_indian(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
