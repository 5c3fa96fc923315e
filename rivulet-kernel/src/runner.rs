//! Runs a script against a session.

use std::sync::Arc;

use rivulet_api::{Container, ForwardMsg, ForwardMsgBody, Initialize, NewReport};
use uuid::Uuid;

use crate::context::SessionContext;
use crate::error::DeltaError;
use crate::generator::DeltaGenerator;
use crate::report::Report;
use crate::widgets::Widgets;

/// The handles a script writes through.
pub struct Script {
    pub main: DeltaGenerator,
    pub sidebar: DeltaGenerator,
}

/// Owns a session's root generators and re-runs its script from scratch.
pub struct ScriptRunner {
    report: Arc<Report>,
    ctx: Arc<SessionContext>,
    main: DeltaGenerator,
    sidebar: DeltaGenerator,
    session_id: String,
}

impl ScriptRunner {
    /// Create a runner and send the session's `Initialize` message.
    pub fn new(report: Arc<Report>, widgets: Arc<Widgets>) -> Self {
        let ctx = SessionContext::new(report.clone(), widgets);
        let session_id = Uuid::new_v4().simple().to_string();

        report.enqueue(ForwardMsg::control(ForwardMsgBody::Initialize(Initialize {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session_id: session_id.clone(),
        })));

        Self {
            main: DeltaGenerator::new(ctx.clone(), Container::Main),
            sidebar: DeltaGenerator::new(ctx.clone(), Container::Sidebar),
            report,
            ctx,
            session_id,
        }
    }

    pub fn report(&self) -> &Arc<Report> {
        &self.report
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.ctx
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run `script` once.
    ///
    /// The previous run's output is discarded and both roots start again at
    /// id 0. An error returned by the script is shown as an exception
    /// element below whatever the script wrote, then returned.
    pub fn run<F>(&mut self, script: F) -> Result<(), DeltaError>
    where
        F: FnOnce(&mut Script) -> Result<(), DeltaError>,
    {
        self.report.clear();
        let report_id = self.report.generate_new_id();
        tracing::info!(report_id = %report_id, name = self.report.name(), "starting script run");

        self.report
            .enqueue(ForwardMsg::control(ForwardMsgBody::NewReport(NewReport {
                id: report_id,
                name: self.report.name().to_string(),
                command_line: self.command_line(),
            })));

        self.main.reset()?;
        self.sidebar.reset()?;

        let mut handles = Script {
            main: self.main.clone(),
            sidebar: self.sidebar.clone(),
        };
        let result = script(&mut handles);
        if let Err(err) = &result {
            tracing::warn!(%err, kind = ?err.kind(), "script run failed");
            handles.main.exception(err);
        }

        self.main = handles.main;
        self.sidebar = handles.sidebar;

        self.report
            .enqueue(ForwardMsg::control(ForwardMsgBody::ReportFinished));
        result
    }

    fn command_line(&self) -> String {
        std::iter::once(self.report.script_path().display().to_string())
            .chain(self.report.argv().iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
