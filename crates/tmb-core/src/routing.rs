use crate::config::Config;

/// Fixed bidirectional map between Telegram chat ids and Messenger thread
/// ids: the primary pair plus an optional test pair.
///
/// Built once at startup and read-only afterwards. The reverse direction is
/// an O(n) scan over the (at most two) pairs.
#[derive(Clone, Debug)]
pub struct RoutingTable {
    pairs: Vec<(i64, i64)>,
}

impl RoutingTable {
    pub fn from_config(cfg: &Config) -> Self {
        let mut pairs = vec![(cfg.group_tg_id, cfg.group_msgr_id)];
        if let (Some(tg), Some(msgr)) = (cfg.test_tg_id, cfg.test_msgr_id) {
            pairs.push((tg, msgr));
        }
        Self { pairs }
    }

    /// Messenger thread for an inbound Telegram chat, if routed.
    pub fn thread_for(&self, tg_chat: i64) -> Option<i64> {
        self.pairs
            .iter()
            .find(|(tg, _)| *tg == tg_chat)
            .map(|(_, msgr)| *msgr)
    }

    /// Telegram chat for an inbound Messenger thread, if routed.
    pub fn chat_for(&self, msgr_thread: i64) -> Option<i64> {
        self.pairs
            .iter()
            .find(|(_, msgr)| *msgr == msgr_thread)
            .map(|(tg, _)| *tg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        let mut cfg = Config::template();
        cfg.group_tg_id = -100;
        cfg.group_msgr_id = 555;
        cfg.test_tg_id = Some(-200);
        cfg.test_msgr_id = Some(777);
        RoutingTable::from_config(&cfg)
    }

    #[test]
    fn maps_both_directions() {
        let t = table();
        assert_eq!(t.thread_for(-100), Some(555));
        assert_eq!(t.chat_for(555), Some(-100));
        assert_eq!(t.thread_for(-200), Some(777));
        assert_eq!(t.chat_for(777), Some(-200));
    }

    #[test]
    fn unmapped_ids_resolve_to_none() {
        let t = table();
        assert_eq!(t.thread_for(1), None);
        assert_eq!(t.chat_for(1), None);
    }

    #[test]
    fn test_pair_requires_both_sides() {
        let mut cfg = Config::template();
        cfg.test_tg_id = Some(-200);
        cfg.test_msgr_id = None;
        let t = RoutingTable::from_config(&cfg);
        assert_eq!(t.thread_for(-200), None);
    }
}
