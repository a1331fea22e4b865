//! `retroport vendors`: the supported router catalog.

use serde::Serialize;
use tabled::Tabled;

use retroport_api::{VendorProfile, Verification, catalog};

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Debug, Serialize)]
struct VendorInfo {
    id: &'static str,
    name: &'static str,
    scheme: &'static str,
    auth: &'static str,
    verification: &'static str,
    csrf: bool,
}

impl From<&VendorProfile> for VendorInfo {
    fn from(p: &VendorProfile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            scheme: p.scheme.as_str(),
            auth: p.auth.label(),
            verification: match p.verify {
                Verification::ListEcho { .. } => "list",
                Verification::SoapList { .. } => "soap-list",
                Verification::BestEffort => "best-effort",
            },
            csrf: p.csrf.is_some(),
        }
    }
}

#[derive(Tabled)]
struct VendorRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Scheme")]
    scheme: &'static str,
    #[tabled(rename = "Auth")]
    auth: &'static str,
    #[tabled(rename = "Verify")]
    verification: &'static str,
    #[tabled(rename = "CSRF")]
    csrf: &'static str,
}

fn vendor_row(v: &VendorInfo) -> VendorRow {
    VendorRow {
        id: v.id,
        name: v.name,
        scheme: v.scheme,
        auth: v.auth,
        verification: v.verification,
        csrf: if v.csrf { "yes" } else { "" },
    }
}

pub fn handle(global: &GlobalOpts) {
    let vendors: Vec<VendorInfo> = catalog::all().iter().map(VendorInfo::from).collect();
    let out = output::render_list(
        &global.output(),
        &vendors,
        vendor_row,
        |v| v.id.to_owned(),
    );
    output::print_output(&out, global.quiet);
}
