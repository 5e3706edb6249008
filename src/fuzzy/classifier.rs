use super::{Activation, FuzzySet, MembershipMode};

/// Linguistic terms for the average queue length, taken as a fraction of `max_th`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqlLabel {
    Conservative,
    Middle,
    Aggressive,
}

/// Linguistic terms for the current max drop probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxPLabel {
    Few,
    Medium,
    Alot,
}

pub const AQL_PARTITION: [(AqlLabel, FuzzySet); 3] = [
    (AqlLabel::Conservative, FuzzySet::new("conservative", 0.0, 0.05, 0.25, 0.30)),
    (AqlLabel::Middle, FuzzySet::new("middle", 0.20, 0.33, 0.66, 0.8)),
    (AqlLabel::Aggressive, FuzzySet::new("aggressive", 0.70, 0.9, 1.0, 1.0)),
];

pub const MAX_P_PARTITION: [(MaxPLabel, FuzzySet); 3] = [
    (MaxPLabel::Few, FuzzySet::new("few", 0.0, 0.0, 0.006, 0.009)),
    (MaxPLabel::Medium, FuzzySet::new("medium", 0.004, 0.02, 0.06, 0.1)),
    (MaxPLabel::Alot, FuzzySet::new("alot", 0.091, 0.1, 1.0, 1.0)),
];

/// Membership of `x` in every set of `partition`, zero degrees included.
pub fn classify<L: Copy>(x: f64, partition: &[(L, FuzzySet)], mode: MembershipMode) -> Vec<Activation<L>> {
    partition
        .iter()
        .map(|(label, set)| Activation::new(*label, set.membership(x, mode)))
        .collect()
}

pub fn classify_aql(ratio: f64, mode: MembershipMode) -> Vec<Activation<AqlLabel>> {
    classify(ratio, &AQL_PARTITION, mode)
}

pub fn classify_max_p(max_p: f64, mode: MembershipMode) -> Vec<Activation<MaxPLabel>> {
    classify(max_p, &MAX_P_PARTITION, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree_of<L: PartialEq>(acts: &[Activation<L>], label: L) -> f64 {
        acts.iter().find(|a| a.label == label).map(|a| a.degree).unwrap_or(0.0)
    }

    #[test]
    fn always_returns_three_activations() {
        assert_eq!(classify_aql(0.0, MembershipMode::Compat).len(), 3);
        assert_eq!(classify_max_p(0.5, MembershipMode::Standard).len(), 3);
    }

    #[test]
    fn low_ratio_is_conservative_only() {
        let acts = classify_aql(0.1, MembershipMode::Standard);
        assert_eq!(degree_of(&acts, AqlLabel::Conservative), 1.0);
        assert_eq!(degree_of(&acts, AqlLabel::Middle), 0.0);
        assert_eq!(degree_of(&acts, AqlLabel::Aggressive), 0.0);
    }

    #[test]
    fn full_ratio_is_aggressive() {
        for mode in [MembershipMode::Compat, MembershipMode::Standard] {
            let acts = classify_aql(1.0, mode);
            assert_eq!(degree_of(&acts, AqlLabel::Aggressive), 1.0);
        }
        let standard = classify_aql(1.0, MembershipMode::Standard);
        assert_eq!(degree_of(&standard, AqlLabel::Conservative), 0.0);
        // compat keeps lower sets saturated past their support
        let compat = classify_aql(1.0, MembershipMode::Compat);
        assert_eq!(degree_of(&compat, AqlLabel::Conservative), 1.0);
    }

    #[test]
    fn overlapping_max_p_region() {
        let acts = classify_max_p(0.095, MembershipMode::Standard);
        assert!(degree_of(&acts, MaxPLabel::Medium) > 0.0);
        assert!(degree_of(&acts, MaxPLabel::Alot) > 0.0);
        assert_eq!(degree_of(&acts, MaxPLabel::Few), 0.0);
    }
}
