//! 命令行入口
//!
//! 结果以 JSON 输出到 stdout；失败时输出 RFC 7807 problem details。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::AppConfig;
use errors::{AppError, AppResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::error;

use crate::application::{DeleteRuleCommand, EditRuleCommand, ServiceHandler, SyncRulesCommand};
use crate::domain::catalog::ProductCatalog;
use crate::domain::repositories::QuotaRuleRepository;
use crate::domain::services::{MatchMode, ValidationReport};
use crate::domain::value_objects::{CategoryId, RequiredQuantity, RuleId, TemplateId};
use crate::infrastructure::persistence::InMemoryQuotaRuleRepository;
use crate::infrastructure::remote::converters::{
    categories_from_dtos, composition_from_dtos, pending_rules_from_dtos, products_from_dtos,
    template_from_dto,
};
use crate::infrastructure::remote::dto::{
    CompositionEntryDto, DesiredRuleDto, ListEnvelope, ValidationFixtureDto,
};
use crate::infrastructure::remote::{
    CatalogApiClient, HttpCatalogGateway, HttpQuotaRuleRepository,
};
use crate::settings;

/// 组合不满足模板时的退出码
const EXIT_INVALID_COMPOSITION: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "basket-template")]
#[command(about = "Gift basket composition checks and quota rule maintenance")]
pub struct Cli {
    /// 配置目录（包含 default.toml）
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 校验一个组合是否满足模板
    Validate(ValidateArgs),
    /// 维护模板的配额规则
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// 本地夹具文件：模板、分类、商品与组合
    #[arg(long, conflicts_with_all = ["template_id", "composition"], required_unless_present = "template_id")]
    pub input: Option<PathBuf>,
    /// 从目录 API 读取的模板
    #[arg(long, requires = "composition")]
    pub template_id: Option<i64>,
    /// 组合文件（配合 --template-id）
    #[arg(long)]
    pub composition: Option<PathBuf>,
    /// 覆盖配置中的匹配模式
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    List {
        #[arg(long)]
        template_id: i64,
    },
    /// 补齐规则：已有分类跳过，其余依次创建
    Sync {
        #[arg(long)]
        template_id: i64,
        #[arg(long)]
        input: PathBuf,
        /// 使用空的内存仓储演练，不访问远程
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    Edit {
        #[arg(long)]
        template_id: i64,
        #[arg(long)]
        rule_id: i64,
        #[arg(long)]
        category_id: i64,
        #[arg(long)]
        quantity: u32,
    },
    Delete {
        #[arg(long)]
        template_id: i64,
        #[arg(long)]
        rule_id: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Strict,
    MinimumOnly,
}

impl From<ModeArg> for MatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => MatchMode::Strict,
            ModeArg::MinimumOnly => MatchMode::MinimumOnly,
        }
    }
}

impl Command {
    /// problem details 中的 `instance`
    fn instance(&self) -> String {
        match self {
            Command::Validate(args) => match (&args.input, args.template_id) {
                (Some(path), _) => path.display().to_string(),
                (None, Some(template_id)) => format!("/templates/{template_id}"),
                (None, None) => "/validate".to_string(),
            },
            Command::Rules { command } => match command {
                RulesCommand::List { template_id }
                | RulesCommand::Sync { template_id, .. } => {
                    format!("/templates/{template_id}/rules")
                }
                RulesCommand::Edit { rule_id, .. } | RulesCommand::Delete { rule_id, .. } => {
                    format!("/rules/{rule_id}")
                }
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationOutput<'a> {
    summary: Vec<String>,
    report: &'a ValidationReport,
}

/// 执行命令并返回进程退出码
pub async fn run(cli: Cli) -> ExitCode {
    let instance = cli.command.instance();
    match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, status = err.status_code(), "Command failed");
            let problem = err.to_problem_details().with_instance(instance);
            match serde_json::to_string_pretty(&problem) {
                Ok(body) => println!("{body}"),
                Err(_) => println!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> AppResult<ExitCode> {
    let config = settings::init_runtime(&cli.config_dir)?;

    match cli.command {
        Command::Validate(args) => validate(&config, args).await,
        Command::Rules { command } => rules(&config, command).await,
    }
}

async fn validate(config: &AppConfig, args: ValidateArgs) -> AppResult<ExitCode> {
    let validator = settings::validator_for(config, args.mode.map(MatchMode::from));
    let repo: Arc<dyn QuotaRuleRepository> = Arc::new(InMemoryQuotaRuleRepository::new());
    let handler = ServiceHandler::new(repo, validator);

    let (template, catalog, composition) = match (args.input, args.template_id, args.composition) {
        (Some(input), _, _) => {
            let fixture: ValidationFixtureDto = read_json(&input).await?;
            let template = template_from_dto(fixture.template)?;
            let catalog = ProductCatalog::new(
                products_from_dtos(fixture.products)?,
                categories_from_dtos(fixture.categories)?,
            );
            (template, catalog, composition_from_dtos(fixture.composition)?)
        }
        (None, Some(template_id), Some(composition)) => {
            let entries: ListEnvelope<CompositionEntryDto> = read_json(&composition).await?;
            let composition = composition_from_dtos(entries.into_items())?;

            let gateway = HttpCatalogGateway::new(CatalogApiClient::new(&config.catalog_api)?);
            let template = gateway.fetch_template(TemplateId(template_id)).await?;
            let catalog = gateway.fetch_catalog().await?;
            (template, catalog, composition)
        }
        _ => {
            return Err(AppError::validation(
                "either --input or --template-id with --composition is required",
            ));
        }
    };

    let report = handler.validate_composition(&template, &composition, &catalog)?;
    print_json(&ValidationOutput {
        summary: report.summary(),
        report: &report,
    })?;

    if report.is_valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_INVALID_COMPOSITION))
    }
}

async fn rules(config: &AppConfig, command: RulesCommand) -> AppResult<ExitCode> {
    let validator = settings::validator_for(config, None);

    match command {
        RulesCommand::List { template_id } => {
            let handler = ServiceHandler::new(remote_repository(config)?, validator);
            let rules = handler.list_rules(TemplateId(template_id)).await?;
            print_json(&rules)?;
        }
        RulesCommand::Sync {
            template_id,
            input,
            offline,
        } => {
            let desired: ListEnvelope<DesiredRuleDto> = read_json(&input).await?;
            let cmd = SyncRulesCommand {
                template_id: TemplateId(template_id),
                rules: pending_rules_from_dtos(desired.into_items())?,
            };

            let (repo, categories) = if offline {
                let repo: Arc<dyn QuotaRuleRepository> =
                    Arc::new(InMemoryQuotaRuleRepository::new());
                (repo, Vec::new())
            } else {
                let client = CatalogApiClient::new(&config.catalog_api)?;
                let categories = HttpCatalogGateway::new(client.clone())
                    .fetch_categories()
                    .await?;
                let repo: Arc<dyn QuotaRuleRepository> =
                    Arc::new(HttpQuotaRuleRepository::new(client));
                (repo, categories)
            };

            let report = ServiceHandler::new(repo, validator)
                .sync_rules(cmd, &categories)
                .await?;
            print_json(&report)?;
            if !report.is_complete() {
                return Ok(ExitCode::FAILURE);
            }
        }
        RulesCommand::Edit {
            template_id,
            rule_id,
            category_id,
            quantity,
        } => {
            let handler = ServiceHandler::new(remote_repository(config)?, validator);
            let rule = handler
                .edit_rule(EditRuleCommand {
                    template_id: TemplateId(template_id),
                    rule_id: RuleId(rule_id),
                    category_id: CategoryId(category_id),
                    required_quantity: RequiredQuantity::new(quantity)?,
                })
                .await?;
            print_json(&rule)?;
        }
        RulesCommand::Delete {
            template_id,
            rule_id,
        } => {
            let handler = ServiceHandler::new(remote_repository(config)?, validator);
            handler
                .delete_rule(DeleteRuleCommand {
                    template_id: TemplateId(template_id),
                    rule_id: RuleId(rule_id),
                })
                .await?;
            print_json(&json!({ "deleted": rule_id }))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn remote_repository(config: &AppConfig) -> AppResult<Arc<dyn QuotaRuleRepository>> {
    let client = CatalogApiClient::new(&config.catalog_api)?;
    Ok(Arc::new(HttpQuotaRuleRepository::new(client)))
}

/// 读取本地 JSON 文件；内容不合法属于调用方输入错误
async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::validation(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::validation(format!("{} is not valid: {e}", path.display())))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("failed to encode output: {e}")))?;
    println!("{body}");
    Ok(())
}
