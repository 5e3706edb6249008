use super::{Activation, AqlLabel, FuzzySet, MaxPLabel, MembershipMode, classify_aql, classify_max_p};

/// Output terms of the rule base, ordered from no dropping to heavy dropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropLevel {
    Zero,
    Low,
    Moderate,
    High,
}

pub const DROP_PARTITION: [(DropLevel, FuzzySet); 4] = [
    (DropLevel::Zero, FuzzySet::new("zero", 0.0, 0.0, 0.0, 0.001)),
    (DropLevel::Low, FuzzySet::new("low", 0.0, 0.002, 0.008, 0.01)),
    (DropLevel::Moderate, FuzzySet::new("moderate", 0.0075, 0.05, 0.1, 0.2)),
    (DropLevel::High, FuzzySet::new("high", 0.2, 0.3, 1.0, 1.0)),
];

/// The fixed rule table.
pub fn consequent(aql: AqlLabel, max_p: MaxPLabel) -> DropLevel {
    use AqlLabel::*;
    use MaxPLabel::*;

    match (aql, max_p) {
        (Conservative, _) => DropLevel::Zero,
        (Middle, Few | Medium) => DropLevel::Zero,
        (Middle, Alot) => DropLevel::Low,
        (Aggressive, Few) => DropLevel::Zero,
        (Aggressive, Medium) => DropLevel::Moderate,
        (Aggressive, Alot) => DropLevel::High,
    }
}

/// Fires every rule with min-conjunction and keeps those with positive strength.
pub fn infer(aql: &[Activation<AqlLabel>], max_p: &[Activation<MaxPLabel>]) -> Vec<Activation<DropLevel>> {
    aql.iter()
        .flat_map(|a| {
            max_p.iter().map(move |m| {
                Activation::new(consequent(a.label, m.label), a.degree.min(m.degree))
            })
        })
        .filter(|fired| fired.degree > 0.0)
        .collect()
}

/// Mean strength per output level. Levels no rule fired get zero.
pub fn aggregate(fired: &[Activation<DropLevel>]) -> [Activation<DropLevel>; 4] {
    DROP_PARTITION.map(|(level, _)| {
        let (sum, n) = fired
            .iter()
            .filter(|f| f.label == level)
            .fold((0.0, 0usize), |(sum, n), f| (sum + f.degree, n + 1));
        let mean = if n == 0 { 0.0 } else { sum / n as f64 };
        Activation::new(level, mean)
    })
}

/// Averages the positive centroids of the output sets.
pub fn defuzzify(levels: &[Activation<DropLevel>; 4]) -> f64 {
    mean_of_positive(
        DROP_PARTITION
            .iter()
            .zip(levels.iter())
            .map(|((_, set), level)| set.centroid(level.degree)),
    )
}

/// Returns 0 instead of dividing by zero when nothing is positive.
fn mean_of_positive(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .filter(|c| *c > 0.0)
        .fold((0.0, 0usize), |(sum, n), c| (sum + c, n + 1));

    if n == 0 {
        return 0.0;
    }
    (sum / n as f64).clamp(0.0, 1.0)
}

/// Full inference pass: classify both inputs, fire the rule base, defuzzify.
///
/// `aql_ratio` is the average queue length divided by the maximum threshold.
pub fn infer_drop_probability(aql_ratio: f64, max_p: f64, mode: MembershipMode) -> f64 {
    let aql = classify_aql(aql_ratio, mode);
    let max_p = classify_max_p(max_p, mode);
    defuzzify(&aggregate(&infer(&aql, &max_p)))
}
