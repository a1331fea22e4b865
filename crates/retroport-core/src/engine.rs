// ── Setup engine ──
//
// One `start_port_forward` invocation end to end: validate the request,
// pick the vendor profile, find the router and the destination, log in,
// install the console's rules one at a time and fold the results into a
// `SetupResponse`. Every failure is recovered here.

use std::net::Ipv4Addr;

use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use retroport_api::{
    LoginCredentials, PortRule, RouterSession, RuleInstaller, VendorProfile, authenticate,
};

use crate::config::EngineConfig;
use crate::discovery::{SystemResolver, TargetResolver, dreamcast_address};
use crate::error::SetupError;
use crate::model::{Console, RouterConfig, SetupResponse, TargetDevice};
use crate::outcome::Outcome;
use crate::validate::{parse_router_ip, validate_credentials};

// ── Phase ────────────────────────────────────────────────────────────

/// Invocation lifecycle, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Init,
    Authenticating,
    AuthFailed,
    Authenticated,
    InstallingRules,
    AllSucceeded,
    PartialOrFullFailure,
}

fn enter(phase: Phase) {
    info!(%phase, "setup phase");
}

// ── PortForwarder ────────────────────────────────────────────────────

/// Production setup engine.
///
/// Holds no per-invocation state: every call builds its own session and
/// cookie jar, so one forwarder can serve concurrent invocations.
#[derive(Debug, Clone)]
pub struct PortForwarder<R = SystemResolver> {
    config: EngineConfig,
    resolver: R,
}

impl PortForwarder<SystemResolver> {
    /// An engine that discovers targets on the host's network.
    pub fn new(config: EngineConfig) -> Self {
        let resolver = SystemResolver::new(config.discovery.clone());
        Self { config, resolver }
    }
}

impl<R: TargetResolver> PortForwarder<R> {
    pub fn with_resolver(config: EngineConfig, resolver: R) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn start_port_forward(&self, request: RouterConfig) -> SetupResponse {
        self.start_port_forward_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Run one setup, aborting with `Cancelled` when `cancel` fires or the
    /// configured deadline passes. Rules already applied stay applied.
    pub async fn start_port_forward_with_cancel(
        &self,
        request: RouterConfig,
        cancel: CancellationToken,
    ) -> SetupResponse {
        let span = info_span!(
            "setup",
            invocation = %Uuid::new_v4(),
            router = %request.router_type,
            console = %request.console,
        );

        async move {
            let deadline = self.config.deadline;
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!("setup cancelled by caller");
                    Err(SetupError::Cancelled)
                }
                finished = tokio::time::timeout(deadline, self.run(request)) => {
                    finished.unwrap_or_else(|_| {
                        warn!(deadline_secs = deadline.as_secs(), "setup deadline exceeded");
                        Err(SetupError::Cancelled)
                    })
                }
            };

            result.unwrap_or_else(|e| {
                warn!(error = %e, "setup failed");
                SetupResponse::failure(e.to_string())
            })
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: RouterConfig) -> Result<SetupResponse, SetupError> {
        enter(Phase::Init);
        validate_credentials(&request.credentials)?;

        let profile = retroport_api::lookup(&request.router_type).ok_or_else(|| {
            SetupError::UnsupportedRouterType {
                router_type: request.router_type.clone(),
            }
        })?;

        let router = self.router_address(&request, profile).await?;
        let rules = self.config.ports.rules_for(request.console);
        let destination = self.destination(&request, router).await?;
        info!(
            vendor = profile.id,
            %router,
            %destination,
            rules = rules.len(),
            "setup target resolved"
        );

        let origin = self.config.transport.origin_for(profile.scheme, router)?;
        let mut session = RouterSession::new(origin, &self.config.transport)?;
        let credentials = LoginCredentials::new(
            request.credentials.username.trim(),
            request.credentials.password.clone(),
        );

        enter(Phase::Authenticating);
        if let Err(e) = self.login(&mut session, profile, &credentials).await {
            enter(Phase::AuthFailed);
            return Err(e);
        }
        enter(Phase::Authenticated);

        enter(Phase::InstallingRules);
        let outcome = install_all(&mut session, profile, &rules, destination).await;
        enter(if outcome.failures() == 0 {
            Phase::AllSucceeded
        } else {
            Phase::PartialOrFullFailure
        });

        Ok(outcome.into_response())
    }

    /// The address the request names, or the default gateway. The manual
    /// profile has no way to guess, so it insists on an explicit address.
    async fn router_address(
        &self,
        request: &RouterConfig,
        profile: &VendorProfile,
    ) -> Result<Ipv4Addr, SetupError> {
        match request.router_ip() {
            Some(ip) => parse_router_ip(ip),
            None if profile.is_manual() => Err(SetupError::InvalidIpFormat {
                value: String::new(),
            }),
            None => self.resolver.router_address().await,
        }
    }

    async fn destination(
        &self,
        request: &RouterConfig,
        router: Ipv4Addr,
    ) -> Result<Ipv4Addr, SetupError> {
        // A Dreamcast reaches its DreamPi at the fixed .98 host; only a
        // Saturn's DreamPi is searched for.
        match (request.target_device, request.console) {
            (Some(TargetDevice::DreamPi) | None, Console::Dreamcast) => Ok(dreamcast_address(router)),
            (Some(TargetDevice::DreamPi), Console::Saturn) => self.resolver.dreampi_address(router).await,
            (Some(TargetDevice::Pc), _) | (None, Console::Saturn) => {
                self.resolver.local_address(router).await
            }
        }
    }

    async fn login(
        &self,
        session: &mut RouterSession,
        profile: &VendorProfile,
        credentials: &LoginCredentials,
    ) -> Result<(), SetupError> {
        let attempts = self.config.login_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match authenticate(session, profile, credentials).await {
                Ok(()) => return Ok(()),
                Err(e) => SetupError::from(e),
            };
            if attempt >= attempts || !err.is_retryable_login() {
                return Err(err);
            }
            warn!(attempt, attempts, error = %err, "login failed, retrying");
            tokio::time::sleep(self.config.transport.retry_backoff * attempt).await;
            attempt += 1;
        }
    }
}

/// Install rules in order, carrying on past failures.
async fn install_all(
    session: &mut RouterSession,
    profile: &'static VendorProfile,
    rules: &[PortRule],
    destination: Ipv4Addr,
) -> Outcome {
    let installer = RuleInstaller::new(profile);
    let mut outcome = Outcome::new(destination).with_manual_hint(profile.is_manual());

    for rule in rules {
        let result = match installer.install(session, rule, destination).await {
            Ok(status) => {
                debug!(rule = %rule, %status, "rule in place");
                Ok(())
            }
            Err(e) => {
                warn!(rule = %rule, error = %e, "rule installation failed");
                Err(SetupError::RuleInstallationFailed {
                    rule: rule.descriptor(),
                    cause: e.to_string(),
                })
            }
        };
        outcome.record(*rule, result);
    }
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::discovery::StaticResolver;
    use crate::model::Credentials;

    fn engine() -> PortForwarder<StaticResolver> {
        PortForwarder::with_resolver(
            EngineConfig::default(),
            StaticResolver {
                router: Some(Ipv4Addr::new(10, 0, 0, 1)),
                local: Some(Ipv4Addr::new(10, 0, 0, 20)),
                dreampi: Some(Ipv4Addr::new(10, 0, 0, 30)),
            },
        )
    }

    fn request(console: Console, target: Option<TargetDevice>) -> RouterConfig {
        let creds = Credentials::new("admin", SecretString::from("pw".to_owned()));
        RouterConfig {
            target_device: target,
            ..RouterConfig::new(console, "ASUS", creds)
        }
    }

    #[tokio::test]
    async fn destination_follows_target_device() {
        let engine = engine();
        let router = Ipv4Addr::new(10, 0, 0, 1);
        let cases = [
            (Console::Dreamcast, Some(TargetDevice::Pc), Ipv4Addr::new(10, 0, 0, 20)),
            (Console::Saturn, Some(TargetDevice::DreamPi), Ipv4Addr::new(10, 0, 0, 30)),
            (Console::Dreamcast, Some(TargetDevice::DreamPi), Ipv4Addr::new(10, 0, 0, 98)),
            (Console::Dreamcast, None, Ipv4Addr::new(10, 0, 0, 98)),
            (Console::Saturn, None, Ipv4Addr::new(10, 0, 0, 20)),
        ];
        for (console, target, expected) in cases {
            let dest = engine
                .destination(&request(console, target), router)
                .await
                .ok();
            assert_eq!(dest, Some(expected), "{console} / {target:?}");
        }
    }

    #[tokio::test]
    async fn router_address_falls_back_to_gateway() {
        let engine = engine();
        let asus = retroport_api::lookup("ASUS").unwrap();
        let addr = engine
            .router_address(&request(Console::Saturn, None), asus)
            .await
            .unwrap();
        assert_eq!(addr, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[tokio::test]
    async fn manual_profile_requires_an_address() {
        let engine = engine();
        let mut req = request(Console::Saturn, None);
        req.router_type = "manual".into();
        let resp = engine.start_port_forward(req).await;
        assert!(!resp.success);
        assert!(
            resp.error.as_deref().unwrap_or_default().starts_with("Invalid IP format"),
            "{resp:?}"
        );
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_lookup() {
        let engine = engine();
        let req = RouterConfig::new(Console::Saturn, "NoSuchRouter", Credentials::default());
        let resp = engine.start_port_forward(req).await;
        assert!(resp.error.unwrap_or_default().starts_with("Invalid configuration"));
    }

    #[test]
    fn phases_render_in_snake_case() {
        assert_eq!(Phase::PartialOrFullFailure.to_string(), "partial_or_full_failure");
        assert_eq!(Phase::AuthFailed.to_string(), "auth_failed");
    }
}
