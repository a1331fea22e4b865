use retroport_core::{DemoService, PortForwardService};

use crate::cli::GlobalOpts;
use crate::output;

pub fn handle(message: &str, global: &GlobalOpts) {
    let reply = DemoService.echo(message);
    output::print_output(&reply, global.quiet);
}
