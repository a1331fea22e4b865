// Port catalog
//
// Canonical rule sets per console. DreamPi dial-up relaying needs the
// same three ports for both consoles; Dreamcast titles that host peer
// sessions need more, which is opt-in.

use std::collections::HashSet;

use retroport_api::{PortRule, Protocol};

use crate::model::Console;

/// Ports the DreamPi relay listens on.
pub const DREAMPI_RULES: [PortRule; 3] = [
    PortRule::tcp(65432),
    PortRule::udp(20001),
    PortRule::udp(20002),
];

/// Dreamcast titles that need inbound ports, deduplicated.
pub const DREAMCAST_GAME_RULES: &[PortRule] = &[
    // Alien Front Online
    PortRule::udp(7980),
    // ChuChu Rocket!
    PortRule::udp(9789),
    // ClassiCube
    PortRule::udp(25565),
    // Daytona USA, Golf Shiyouyo 2, Sega Tetris
    PortRule::udp(20675),
    PortRule::udp(12079),
    // Dee Dee Planet
    PortRule::udp(9879),
    // Driving Strikers
    PortRule::udp(30099),
    // Floigan Bros.
    PortRule::tcp(37001),
    // Internet Game Pack, 2K sports
    PortRule::udp(5656),
    PortRule::tcp(5011),
    PortRule::tcp(10500),
    PortRule::tcp(10501),
    PortRule::tcp(10502),
    PortRule::tcp(10503),
    PortRule::udp(5502),
    PortRule::udp(5503),
    PortRule::tcp(6666),
    // The Next Tetris
    PortRule::tcp(3512),
    PortRule::udp(3512),
    // Ooga Booga
    PortRule::udp(6001),
    // PBA Tour Bowling 2001, Starlancer
    PortRule::tcp(2300),
    PortRule::udp(2300),
    PortRule::tcp(2400),
    PortRule::udp(2400),
    PortRule::udp(6500),
    PortRule::tcp(47624),
    PortRule::udp(13139),
    // Planet Ring
    PortRule::udp(7648),
    PortRule::udp(1285),
    PortRule::udp(1028),
    // World Series Baseball 2K2
    PortRule::udp(37171),
    PortRule::udp(13713),
    // Worms World Party
    PortRule::tcp(17219),
];

/// Which rules a setup applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortCatalog {
    /// Add the Dreamcast per-game rules after the DreamPi set.
    pub include_game_ports: bool,
    /// Extra rules from configuration, applied to every console.
    pub extra: Vec<PortRule>,
}

impl PortCatalog {
    /// Ordered, duplicate-free rule list for `console`.
    pub fn rules_for(&self, console: Console) -> Vec<PortRule> {
        let games = match console {
            Console::Dreamcast if self.include_game_ports => DREAMCAST_GAME_RULES,
            _ => &[],
        };
        let mut seen: HashSet<(Protocol, u16)> = HashSet::new();
        DREAMPI_RULES
            .iter()
            .chain(games)
            .chain(&self.extra)
            .filter(|rule| rule.is_valid() && seen.insert((rule.protocol, rule.external)))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn descriptors(rules: &[PortRule]) -> Vec<String> {
        rules.iter().map(PortRule::descriptor).collect()
    }

    #[test]
    fn both_consoles_get_the_dreampi_set() {
        let catalog = PortCatalog::default();
        for console in [Console::Saturn, Console::Dreamcast] {
            assert_eq!(
                descriptors(&catalog.rules_for(console)),
                vec!["TCP 65432", "UDP 20001", "UDP 20002"]
            );
        }
    }

    #[test]
    fn game_ports_are_dreamcast_only() {
        let catalog = PortCatalog {
            include_game_ports: true,
            ..PortCatalog::default()
        };
        assert_eq!(catalog.rules_for(Console::Saturn).len(), 3);
        let dreamcast = catalog.rules_for(Console::Dreamcast);
        assert_eq!(dreamcast.len(), 3 + DREAMCAST_GAME_RULES.len());
        assert_eq!(dreamcast[3], PortRule::udp(7980));
    }

    #[test]
    fn game_rules_have_no_duplicates() {
        let unique: HashSet<_> = DREAMCAST_GAME_RULES
            .iter()
            .map(|r| (r.protocol, r.external))
            .collect();
        assert_eq!(unique.len(), DREAMCAST_GAME_RULES.len());
    }

    #[test]
    fn extra_rules_are_deduplicated() {
        let catalog = PortCatalog {
            include_game_ports: false,
            extra: vec![PortRule::udp(20001), PortRule::tcp(8080), PortRule::udp(0)],
        };
        assert_eq!(
            descriptors(&catalog.rules_for(Console::Saturn)),
            vec!["TCP 65432", "UDP 20001", "UDP 20002", "TCP 8080"]
        );
    }
}
