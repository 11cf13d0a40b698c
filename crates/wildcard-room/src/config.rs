//! Room tuning knobs.

use std::time::Duration;

use wildcard_game::Rules;

/// Per-room configuration, fixed when the room is created.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Table rules handed to the game engine.
    pub rules: Rules,

    /// Bounds for the simulated think time before a bot seat acts.
    pub bot_delay_min: Duration,
    pub bot_delay_max: Duration,

    /// Mailbox capacity of the room task. Senders wait when it is full.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            bot_delay_min: Duration::from_millis(600),
            bot_delay_max: Duration::from_millis(1800),
            channel_size: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sane() {
        let config = RoomConfig::default();
        assert_eq!(config.rules.min_seats, 2);
        assert_eq!(config.rules.max_seats, 4);
        assert!(config.bot_delay_min <= config.bot_delay_max);
        assert!(config.channel_size > 0);
    }
}
