use crate::category::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisposalRule {
    pub bin_color: &'static str,
    pub advice: &'static str,
}

/// Returned for labels outside the known category set.
pub const UNKNOWN_DISPOSAL: DisposalRule = DisposalRule {
    bin_color: "unknown",
    advice: "consult local guidance",
};

// Bin colors follow the French sorting scheme.
pub fn rule_for(category: Category) -> DisposalRule {
    let (bin_color, advice) = match category {
        Category::Cardboard => (
            "yellow",
            "Flatten cardboard boxes before putting them in the yellow bin.",
        ),
        Category::Glass => ("green", "Drop it in the glass container, without the cap."),
        Category::Metal => ("yellow", "Tins and cans. Yellow bin."),
        Category::Paper => ("yellow", "Yellow bin. No need to crumple it."),
        Category::Plastic => ("yellow", "Bottles and flasks only. Yellow bin."),
        Category::Trash => ("gray", "Non-recyclable waste. Gray or black bin."),
    };
    DisposalRule { bin_color, advice }
}

/// Looks up disposal guidance by label name. Never fails: unknown labels get
/// [`UNKNOWN_DISPOSAL`].
pub fn map_to_disposal(label: &str) -> DisposalRule {
    label
        .parse::<Category>()
        .map(rule_for)
        .unwrap_or(UNKNOWN_DISPOSAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_guidance() {
        for category in Category::ALL {
            let rule = rule_for(category);
            assert!(!rule.bin_color.is_empty());
            assert!(!rule.advice.is_empty());
            assert_ne!(rule, UNKNOWN_DISPOSAL);
        }
    }

    #[test]
    fn test_bin_colors() {
        assert_eq!(rule_for(Category::Cardboard).bin_color, "yellow");
        assert_eq!(rule_for(Category::Glass).bin_color, "green");
        assert_eq!(rule_for(Category::Metal).bin_color, "yellow");
        assert_eq!(rule_for(Category::Paper).bin_color, "yellow");
        assert_eq!(rule_for(Category::Plastic).bin_color, "yellow");
        assert_eq!(rule_for(Category::Trash).bin_color, "gray");
    }

    #[test]
    fn test_metal_advice() {
        let rule = map_to_disposal("metal");

        assert_eq!(rule.advice, "Tins and cans. Yellow bin.");
    }

    #[test]
    fn test_map_by_label() {
        assert_eq!(map_to_disposal("glass"), rule_for(Category::Glass));
        assert_eq!(map_to_disposal("PAPER"), rule_for(Category::Paper));
    }

    #[test]
    fn test_unknown_label_returns_sentinel() {
        assert_eq!(map_to_disposal("styrofoam"), UNKNOWN_DISPOSAL);
        assert_eq!(map_to_disposal(""), UNKNOWN_DISPOSAL);
        assert_eq!(UNKNOWN_DISPOSAL.bin_color, "unknown");
        assert_eq!(UNKNOWN_DISPOSAL.advice, "consult local guidance");
    }
}
