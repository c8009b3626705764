//! Load-balancer weight calculation.

use crate::config::WeightConfig;
use crate::overlay::NodeStatus;

/// Map the post-override status and participant count to a weight percentage.
///
/// Full weight while strictly under capacity, then a sharp drop once capacity
/// is reached or exceeded: the weight is `100%` divided by the capacity
/// multiple, rounded to the nearest 5% and floored at the configured minimum
/// so an otherwise-healthy node never reads as fully down. An unknown count
/// fails safe to zero weight rather than guessing capacity.
pub fn weight_percent(status: NodeStatus, participants: Option<u64>, config: &WeightConfig) -> String {
    if matches!(status, NodeStatus::Drain | NodeStatus::Maint) {
        return "0%".to_string();
    }

    if !config.enabled {
        return "100%".to_string();
    }

    let Some(count) = participants else {
        tracing::warn!("participant count unknown, reporting zero weight");
        return "0%".to_string();
    };

    let capacity = config.participant_max.max(1);
    let multiple = count / capacity + 1;
    let percent = ((100.0 / multiple as f64) / 5.0).round() as u64 * 5;
    let percent = percent.max(config.minimum_percent);

    format!("{}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(participant_max: u64) -> WeightConfig {
        WeightConfig {
            enabled: true,
            participant_max,
            minimum_percent: 10,
        }
    }

    #[test]
    fn drain_and_maint_are_zero() {
        let config = enabled(100);
        assert_eq!(weight_percent(NodeStatus::Drain, Some(1), &config), "0%");
        assert_eq!(weight_percent(NodeStatus::Maint, Some(1), &config), "0%");
        assert_eq!(weight_percent(NodeStatus::Drain, None, &config), "0%");
    }

    #[test]
    fn disabled_is_always_full() {
        let config = WeightConfig {
            enabled: false,
            participant_max: 100,
            minimum_percent: 10,
        };
        assert_eq!(weight_percent(NodeStatus::Ready, Some(10_000), &config), "100%");
        assert_eq!(weight_percent(NodeStatus::Ready, None, &config), "100%");
    }

    #[test]
    fn unknown_count_fails_safe() {
        assert_eq!(weight_percent(NodeStatus::Ready, None, &enabled(100)), "0%");
    }

    #[test]
    fn full_weight_strictly_under_capacity() {
        let config = enabled(100);
        assert_eq!(weight_percent(NodeStatus::Ready, Some(0), &config), "100%");
        assert_eq!(weight_percent(NodeStatus::Ready, Some(99), &config), "100%");
    }

    #[test]
    fn sharp_drop_at_capacity() {
        let config = enabled(100);
        assert_eq!(weight_percent(NodeStatus::Ready, Some(100), &config), "50%");
        assert_eq!(weight_percent(NodeStatus::Ready, Some(199), &config), "50%");
        assert_eq!(weight_percent(NodeStatus::Ready, Some(200), &config), "35%");
        assert_eq!(weight_percent(NodeStatus::Ready, Some(300), &config), "25%");
    }

    #[test]
    fn floored_at_minimum() {
        let config = enabled(10);
        // 12x over capacity would round to 10%, far over to 5% or 0%; the
        // floor holds it at the configured minimum.
        assert_eq!(weight_percent(NodeStatus::Ready, Some(500), &config), "10%");
    }
}
