use serde::Serialize;

use crate::model::Transaction;

const PERCENTILE: f64 = 0.95;

/// Dashboard statistics derived from a transaction list.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub high_risk: usize,
    pub average_risk: f64,
    pub p95_risk: f64,
    pub confirmed_fraud: usize,
    /// Share of high-risk transactions, as a whole percentage.
    pub alert_rate: u32,
}

impl Summary {
    pub fn from_transactions(transactions: &[Transaction]) -> Summary {
        let total = transactions.len();
        if total == 0 {
            return Summary::default();
        }

        let high_risk = transactions.iter().filter(|t| t.is_high_risk()).count();
        let confirmed_fraud = transactions.iter().filter(|t| t.is_fraud).count();

        let mut scores: Vec<f64> = transactions.iter().map(Transaction::score).collect();
        let average_risk = mean(&scores);

        scores.sort_by(f64::total_cmp);
        let p95_risk = scores[nearest_rank(total, PERCENTILE)];

        Summary {
            total,
            high_risk,
            average_risk,
            p95_risk,
            confirmed_fraud,
            alert_rate: (high_risk as f64 / total as f64 * 100.0).round() as u32,
        }
    }
}

/// Arithmetic mean of finite scores. Falls back to summing pre-divided
/// terms when the plain sum overflows, so the result stays finite.
fn mean(scores: &[f64]) -> f64 {
    let len = scores.len() as f64;
    let sum = scores.iter().sum::<f64>();
    if sum.is_finite() {
        sum / len
    } else {
        scores.iter().map(|s| s / len).sum()
    }
}

/// Index of the sample reported as the `percentile` of `len` sorted samples.
///
/// This is a nearest-rank estimate, `floor(percentile * (len - 1))`: it picks
/// an existing sample instead of interpolating between neighbours, so on small
/// samples it can sit noticeably below or above the true percentile.
/// `len` must be non-zero.
pub fn nearest_rank(len: usize, percentile: f64) -> usize {
    ((percentile * (len - 1) as f64).floor() as usize).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLevel;

    fn transaction(score: Option<f64>, level: Option<RiskLevel>, is_fraud: bool) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "risk_score": score,
            "risk_level": level,
            "is_fraud": is_fraud,
        }))
        .expect("Error building the transaction")
    }

    #[test]
    fn empty_list_has_zeroed_summary() {
        let summary = Summary::from_transactions(&[]);

        assert_eq!(0, summary.total);
        assert_eq!(0.0, summary.average_risk);
        assert_eq!(0.0, summary.p95_risk);
        assert_eq!(0, summary.alert_rate);
    }

    #[test]
    fn all_high_risk_gives_full_alert_rate() {
        let transactions: Vec<_> = (0..7)
            .map(|i| transaction(Some(80.0 + i as f64), Some(RiskLevel::High), false))
            .collect();

        let summary = Summary::from_transactions(&transactions);

        assert_eq!(summary.total, summary.high_risk);
        assert_eq!(100, summary.alert_rate);
    }

    #[test]
    fn p95_picks_the_ninth_of_ten() {
        assert_eq!(8, nearest_rank(10, PERCENTILE));

        let transactions: Vec<_> = (1..=10)
            .map(|i| transaction(Some(i as f64 * 10.0), Some(RiskLevel::Low), false))
            .collect();

        assert_eq!(90.0, Summary::from_transactions(&transactions).p95_risk);
    }

    #[test]
    fn p95_sorts_before_selecting() {
        let transactions: Vec<_> = [50.0, 10.0, 99.0, 30.0]
            .iter()
            .map(|s| transaction(Some(*s), None, false))
            .collect();

        // floor(0.95 * 3) = 2 -> third smallest
        assert_eq!(50.0, Summary::from_transactions(&transactions).p95_risk);
    }

    #[test]
    fn single_record_is_its_own_percentile() {
        let summary = Summary::from_transactions(&[transaction(Some(12.0), None, false)]);

        assert_eq!(12.0, summary.p95_risk);
        assert_eq!(12.0, summary.average_risk);
    }

    #[test]
    fn missing_score_counts_as_zero() {
        let transactions = vec![
            transaction(Some(60.0), Some(RiskLevel::Medium), false),
            transaction(None, Some(RiskLevel::Low), false),
        ];

        let summary = Summary::from_transactions(&transactions);

        assert_eq!(30.0, summary.average_risk);
        assert_eq!(0.0, summary.p95_risk);
    }

    #[test]
    fn counts_high_risk_and_confirmed_fraud() {
        let transactions = vec![
            transaction(Some(90.0), Some(RiskLevel::High), true),
            transaction(Some(20.0), Some(RiskLevel::Low), true),
            transaction(Some(55.0), Some(RiskLevel::Medium), false),
        ];

        let summary = Summary::from_transactions(&transactions);

        assert_eq!(1, summary.high_risk);
        assert_eq!(2, summary.confirmed_fraud);
        // 1/3 -> 33.33%
        assert_eq!(33, summary.alert_rate);
    }

    #[test]
    fn huge_scores_keep_a_finite_average() {
        let transactions = vec![
            transaction(Some(1e308), Some(RiskLevel::High), false),
            transaction(Some(1e308), Some(RiskLevel::High), false),
        ];

        let summary = Summary::from_transactions(&transactions);

        assert_eq!(1e308, summary.average_risk);
        assert_eq!(
            serde_json::json!(1e308),
            serde_json::to_value(&summary).expect("Error serializing summary")["average_risk"]
        );
    }

    #[test]
    fn alert_rate_rounds_half_up() {
        let mut transactions = vec![transaction(Some(90.0), Some(RiskLevel::High), false)];
        transactions.extend((0..7).map(|_| transaction(Some(5.0), Some(RiskLevel::Low), false)));

        // 1/8 -> 12.5%
        assert_eq!(13, Summary::from_transactions(&transactions).alert_rate);
    }
}
