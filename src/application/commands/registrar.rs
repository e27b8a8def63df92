//! `pmregistrar`: the domain registrar processing module.
//!
//! Service operations report completion to the billing core right away;
//! the registrar's own domain store is outside this module. When an
//! operation fails the error is saved on its running operation so the
//! daemon can show it and, for an item, hand it to an administrator.

use std::sync::Arc;

use crate::adapters::xml::{ErrorDocument, XmlNode};
use crate::config::RegistrarConfig;
use crate::domain::foundation::{BillingError, ElId};
use crate::domain::signature::constant_time_eq;
use crate::ports::{BillingCore, ServiceCompletion};

use super::{CommandOutput, FormReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarCommand {
    Features,
    CheckConnection { form: XmlNode },
    TuneConnection { form: XmlNode },
    Import,
    Open,
    Suspend,
    Resume,
    Close,
    SetParam,
    Prolong,
    Transfer,
    SyncItem,
    TuneService,
    GetContactType,
    TuneServiceProfile,
    ValidateServiceProfile,
    UpdateNs,
    Whois,
}

impl RegistrarCommand {
    pub fn parse(command: &str, read_form: FormReader<'_>) -> Result<Self, BillingError> {
        let parsed = match command {
            "features" => RegistrarCommand::Features,
            "check_connection" => RegistrarCommand::CheckConnection { form: read_form()? },
            "tune_connection" => RegistrarCommand::TuneConnection { form: read_form()? },
            "import" => RegistrarCommand::Import,
            "open" => RegistrarCommand::Open,
            "suspend" => RegistrarCommand::Suspend,
            "resume" => RegistrarCommand::Resume,
            "close" => RegistrarCommand::Close,
            "setparam" => RegistrarCommand::SetParam,
            "prolong" => RegistrarCommand::Prolong,
            "transfer" => RegistrarCommand::Transfer,
            "sync_item" => RegistrarCommand::SyncItem,
            "tune_service" => RegistrarCommand::TuneService,
            "get_contact_type" => RegistrarCommand::GetContactType,
            "tune_service_profile" => RegistrarCommand::TuneServiceProfile,
            "validate_service_profile" => RegistrarCommand::ValidateServiceProfile,
            "update_ns" => RegistrarCommand::UpdateNs,
            "whois" => RegistrarCommand::Whois,
            other => return Err(BillingError::UnknownCommand(other.to_string())),
        };
        Ok(parsed)
    }

    /// The completion notice this operation sends, if it is a service operation.
    fn completion(&self) -> Option<ServiceCompletion> {
        match self {
            RegistrarCommand::Open | RegistrarCommand::Transfer => Some(ServiceCompletion::DomainOpen),
            RegistrarCommand::Suspend => Some(ServiceCompletion::Suspend),
            RegistrarCommand::Resume => Some(ServiceCompletion::Resume),
            RegistrarCommand::Close => Some(ServiceCompletion::Close),
            RegistrarCommand::SetParam => Some(ServiceCompletion::SetParam),
            RegistrarCommand::Prolong => Some(ServiceCompletion::Prolong),
            _ => None,
        }
    }
}

/// Features advertised by `features`, in the order the daemon lists them.
const FEATURES: [&str; 17] = [
    "check_connection",
    "tune_connection",
    "import",
    "open",
    "suspend",
    "resume",
    "close",
    "setparam",
    "prolong",
    "transfer",
    "sync_item",
    "tune_service",
    "get_contact_type",
    "tune_service_profile",
    "validate_service_profile",
    "update_ns",
    "whois",
];

/// Flags the daemon passes along with `--command`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrarArgs {
    pub item: Option<ElId>,
    pub runningoperation: Option<ElId>,
    pub subcommand: Option<String>,
    pub id: Option<String>,
    pub lang: Option<String>,
    pub module: Option<String>,
    pub itemtype: Option<String>,
    pub intname: Option<String>,
    pub param: Option<String>,
    pub value: Option<String>,
    pub level: Option<String>,
    pub addon: Option<String>,
    pub tld: Option<String>,
    pub searchstring: Option<String>,
}

impl RegistrarArgs {
    /// Parses an id flag; `0` means the flag was not meant.
    pub fn id_flag(flag: &str, raw: Option<&str>) -> Result<Option<ElId>, BillingError> {
        match raw {
            Some(raw) if !raw.trim().is_empty() => {
                Ok(Some(ElId::parse(flag, raw)?).filter(|id| !id.is_zero()))
            }
            _ => Ok(None),
        }
    }

    fn require_item(&self) -> Result<&ElId, BillingError> {
        self.item.as_ref().ok_or_else(|| BillingError::missing("item"))
    }
}

/// Runs registrar commands and records their failures.
pub struct RegistrarModule {
    core: Arc<dyn BillingCore>,
    config: RegistrarConfig,
}

impl RegistrarModule {
    pub fn new(core: Arc<dyn BillingCore>, config: RegistrarConfig) -> Self {
        Self { core, config }
    }

    /// Parses and runs `command`, recording any failure on the running
    /// operation before returning it.
    pub async fn run(
        &self,
        command: &str,
        args: &RegistrarArgs,
        read_form: FormReader<'_>,
    ) -> Result<CommandOutput, BillingError> {
        tracing::debug!(
            command,
            item = ?args.item,
            runningoperation = ?args.runningoperation,
            "Registrar command"
        );
        let result = match RegistrarCommand::parse(command, read_form) {
            Ok(parsed) => self.handle(parsed, args).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.record_failure(command, args, e).await;
        }
        result
    }

    pub async fn handle(
        &self,
        command: RegistrarCommand,
        args: &RegistrarArgs,
    ) -> Result<CommandOutput, BillingError> {
        if let Some(completion) = command.completion() {
            let item = args.require_item()?;
            self.core.complete_service_operation(completion, item).await?;
            tracing::info!(item = %item, command = completion.command(), "Service operation completed");
            return Ok(CommandOutput::Silent);
        }

        match command {
            RegistrarCommand::Features => Ok(CommandOutput::Document(features())),
            RegistrarCommand::CheckConnection { form } => {
                self.check_connection(&form)?;
                Ok(CommandOutput::ok())
            }
            RegistrarCommand::TuneConnection { mut form } => {
                form.add_child(
                    XmlNode::new("slist")
                        .with_attr("name", "whois_lang")
                        .with_child(XmlNode::new("msg").with_text("ru"))
                        .with_child(XmlNode::new("msg").with_text("en")),
                );
                Ok(CommandOutput::Document(form))
            }
            _ => Ok(CommandOutput::Silent),
        }
    }

    fn check_connection(&self, form: &XmlNode) -> Result<(), BillingError> {
        let module = form.child("processingmodule");
        let registrar = module
            .and_then(|m| m.child_text("registrar_name"))
            .unwrap_or_default();
        let password = module
            .and_then(|m| m.child("password"))
            .map(|p| p.text.trim())
            .unwrap_or_default();

        if !constant_time_eq(password.as_bytes(), self.config.connection_password().as_bytes()) {
            tracing::warn!(registrar, "Connection check failed");
            return Err(BillingError::invalid_value("password", "", "connection refused"));
        }
        tracing::info!(registrar, "Connection check passed");
        Ok(())
    }

    async fn record_failure(&self, command: &str, args: &RegistrarArgs, error: &BillingError) {
        let Some(operation) = &args.runningoperation else {
            return;
        };
        let error_xml = ErrorDocument::from(error).to_node().to_fragment();
        if let Err(e) = self.core.record_operation_error(operation, &error_xml).await {
            tracing::error!(operation = %operation, error = %e, "Operation error not saved");
            return;
        }

        let Some(item) = &args.item else {
            return;
        };
        if let Err(e) = self.escalate(command, item, operation).await {
            tracing::error!(operation = %operation, item = %item, error = %e, "Operation not escalated");
        }
    }

    /// Switches the operation to manual and opens a task when the core has
    /// a task type for the command.
    async fn escalate(&self, command: &str, item: &ElId, operation: &ElId) -> Result<(), BillingError> {
        self.core.set_operation_manual(operation).await?;
        if let Some(task_type) = self.core.task_type(command).await? {
            self.core.create_task(item, operation, &task_type).await?;
            tracing::info!(item = %item, task_type = %task_type, "Task created for failed operation");
        }
        Ok(())
    }
}

fn features() -> XmlNode {
    let itemtypes = XmlNode::new("itemtypes")
        .with_child(XmlNode::new("itemtype").with_attr("name", "domain"));
    let params = XmlNode::new("params")
        .with_child(XmlNode::new("param").with_attr("name", "registrar_name"))
        .with_child(XmlNode::new("param").with_attr("name", "whois_lang"))
        .with_child(
            XmlNode::new("param")
                .with_attr("name", "password")
                .with_attr("crypted", "yes"),
        );
    let mut features = XmlNode::new("features");
    for name in FEATURES {
        features
            .children
            .push(XmlNode::new("feature").with_attr("name", name));
    }
    XmlNode::doc()
        .with_child(itemtypes)
        .with_child(params)
        .with_child(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingCore;

    fn id(raw: &str) -> ElId {
        ElId::parse("elid", raw).unwrap()
    }

    fn module(core: Arc<InMemoryBillingCore>) -> RegistrarModule {
        RegistrarModule::new(core, RegistrarConfig::default())
    }

    fn no_form() -> impl FnMut() -> Result<XmlNode, BillingError> {
        || Err(BillingError::missing("stdin"))
    }

    fn connection(password: &str) -> impl FnMut() -> Result<XmlNode, BillingError> {
        let xml = format!(
            "<doc><processingmodule><registrar_name>reg</registrar_name><password>{}</password></processingmodule></doc>",
            password
        );
        move || Ok(XmlNode::parse(&xml)?)
    }

    // ══════════════════════════════════════════════════════════════
    // Features and connection
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn features_lists_domain_item_type_and_operations() {
        let core = Arc::new(InMemoryBillingCore::new());
        let output = module(core)
            .run("features", &RegistrarArgs::default(), &mut no_form())
            .await
            .unwrap();
        let rendered = output.render();

        assert!(rendered.contains(r#"<itemtypes><itemtype name="domain"/></itemtypes>"#));
        assert!(rendered.contains(r#"<param name="password" crypted="yes"/>"#));
        assert_eq!(rendered.matches("<feature ").count(), FEATURES.len());
        assert!(rendered.contains(r#"<feature name="whois"/>"#));
    }

    #[tokio::test]
    async fn check_connection_accepts_configured_password() {
        let core = Arc::new(InMemoryBillingCore::new());
        let output = module(core)
            .run("check_connection", &RegistrarArgs::default(), &mut connection("test"))
            .await
            .unwrap();
        assert_eq!(output, CommandOutput::ok());
    }

    #[tokio::test]
    async fn check_connection_rejects_wrong_password_without_echoing_it() {
        let core = Arc::new(InMemoryBillingCore::new());
        let err = module(core)
            .run("check_connection", &RegistrarArgs::default(), &mut connection("hunter2"))
            .await
            .unwrap_err();

        assert_eq!(err.object(), Some("password"));
        assert!(!ErrorDocument::from(&err).render().contains("hunter2"));
    }

    #[tokio::test]
    async fn tune_connection_adds_whois_languages() {
        let core = Arc::new(InMemoryBillingCore::new());
        let mut form = || Ok::<_, BillingError>(XmlNode::doc());
        let rendered = module(core)
            .run("tune_connection", &RegistrarArgs::default(), &mut form)
            .await
            .unwrap()
            .render();
        assert!(rendered.contains(r#"<slist name="whois_lang"><msg>ru</msg><msg>en</msg></slist>"#));
    }

    // ══════════════════════════════════════════════════════════════
    // Service operations
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn service_operations_report_completion() {
        let cases = [
            ("open", ServiceCompletion::DomainOpen),
            ("transfer", ServiceCompletion::DomainOpen),
            ("suspend", ServiceCompletion::Suspend),
            ("resume", ServiceCompletion::Resume),
            ("close", ServiceCompletion::Close),
            ("setparam", ServiceCompletion::SetParam),
            ("prolong", ServiceCompletion::Prolong),
        ];
        for (command, completion) in cases {
            let core = Arc::new(InMemoryBillingCore::new());
            let args = RegistrarArgs {
                item: Some(id("15")),
                ..Default::default()
            };

            let output = module(core.clone())
                .run(command, &args, &mut no_form())
                .await
                .unwrap();

            assert_eq!(output, CommandOutput::Silent);
            assert_eq!(core.completed_operations(), vec![(completion, "15".to_string())], "{}", command);
        }
    }

    #[tokio::test]
    async fn informational_commands_touch_nothing() {
        for command in ["import", "sync_item", "whois", "update_ns"] {
            let core = Arc::new(InMemoryBillingCore::new());
            module(core.clone())
                .run(command, &RegistrarArgs::default(), &mut no_form())
                .await
                .unwrap();
            assert!(core.calls().is_empty(), "{}", command);
        }
    }

    #[tokio::test]
    async fn service_operation_without_item_is_rejected() {
        let core = Arc::new(InMemoryBillingCore::new());
        let err = module(core.clone())
            .run("open", &RegistrarArgs::default(), &mut no_form())
            .await
            .unwrap_err();
        assert_eq!(err, BillingError::missing("item"));
        assert!(core.calls().is_empty());
    }

    // ══════════════════════════════════════════════════════════════
    // Failure recording
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn failure_is_saved_on_running_operation_and_escalated() {
        let core = Arc::new(InMemoryBillingCore::new().with_task_type("open", "registrar_open"));
        core.fail_on("domain.open", BillingError::billing_core("item locked"));
        let args = RegistrarArgs {
            item: Some(id("15")),
            runningoperation: Some(id("300")),
            ..Default::default()
        };

        let result = module(core.clone()).run("open", &args, &mut no_form()).await;

        assert!(result.is_err());
        let saved = core.operation_error("300").unwrap();
        assert!(saved.contains(r#"<error type="upstream">"#));
        assert!(saved.contains("item locked"));
        assert!(core.is_manual("300"));
        assert_eq!(core.tasks().len(), 1);
        assert_eq!(core.tasks()[0].task_type, "registrar_open");
        assert_eq!(core.tasks()[0].operation, "300");
    }

    #[tokio::test]
    async fn failure_without_item_is_only_saved() {
        let core = Arc::new(InMemoryBillingCore::new());
        let args = RegistrarArgs {
            runningoperation: Some(id("300")),
            ..Default::default()
        };

        let _ = module(core.clone()).run("refund", &args, &mut no_form()).await;

        assert!(core.operation_error("300").unwrap().contains("unknown_command"));
        assert!(!core.is_manual("300"));
        assert!(core.tasks().is_empty());
    }

    #[tokio::test]
    async fn no_task_without_task_type() {
        let core = Arc::new(InMemoryBillingCore::new());
        core.fail_on("service.postclose", BillingError::billing_core("down"));
        let args = RegistrarArgs {
            item: Some(id("15")),
            runningoperation: Some(id("300")),
            ..Default::default()
        };

        let _ = module(core.clone()).run("close", &args, &mut no_form()).await;

        assert!(core.is_manual("300"));
        assert_eq!(core.call_count("task.gettype"), 1);
        assert!(core.tasks().is_empty());
    }

    #[test]
    fn zero_id_flag_means_absent() {
        assert_eq!(RegistrarArgs::id_flag("item", Some("0")).unwrap(), None);
        assert_eq!(RegistrarArgs::id_flag("item", None).unwrap(), None);
        assert_eq!(RegistrarArgs::id_flag("item", Some("12")).unwrap(), Some(id("12")));
        assert!(RegistrarArgs::id_flag("item", Some("x")).is_err());
    }
}
