//! `retroport ports`: preview the rules a setup would install.

use tabled::Tabled;

use retroport_api::PortRule;

use crate::cli::{GlobalOpts, PortsArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "External")]
    external: u16,
    #[tabled(rename = "Internal")]
    internal: u16,
    #[tabled(rename = "Rule name")]
    name: String,
}

fn rule_row(r: &PortRule) -> RuleRow {
    RuleRow {
        protocol: r.protocol.to_string(),
        external: r.external,
        internal: r.internal,
        name: r.rule_name(),
    }
}

pub fn handle(args: &PortsArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut catalog = cfg.engine_config(None)?.ports;
    catalog.include_game_ports |= args.games;

    let rules = catalog.rules_for(args.console);
    let out = output::render_list(&global.output(), &rules, rule_row, PortRule::descriptor);
    output::print_output(&out, global.quiet);
    Ok(())
}
