use std::path::PathBuf;

use clap::{Parser, Subcommand};
use genflow::cli::{local_engine, load_knowledge, parse_metadata, run_workflow, test_knowledge_tool, validate_workflow};
use genflow::utils::LoggingConfig;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "genflow", version, about = "Workflow engine CLI", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 编译工作流并打印执行顺序
    Validate { workflow: PathBuf },
    /// 不保存直接运行工作流
    Run {
        workflow: PathBuf,
        #[arg(long, short)]
        message: String,
        /// JSON 对象，例如 '{"thread_id":"t1"}'
        #[arg(long)]
        metadata: Option<String>,
        /// 模型配置 JSON 数组；缺省使用本地回显模型
        #[arg(long)]
        models: Option<PathBuf>,
        /// 知识库 JSON：`{"<base id>": ["document", ...]}`
        #[arg(long)]
        knowledge: Option<PathBuf>,
        /// API key 以 base64 存储
        #[arg(long)]
        base64_keys: bool,
    },
    /// 单独测试知识库检索节点
    Knowledge {
        /// 节点配置 JSON，例如 '{"selectedBases":["docs"],"limit":3}'
        #[arg(long)]
        config: String,
        #[arg(long, short)]
        query: String,
        #[arg(long)]
        knowledge: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { workflow } => handle_validate(workflow).await?,
        Command::Run {
            workflow,
            message,
            metadata,
            models,
            knowledge,
            base64_keys,
        } => handle_run(workflow, message, metadata, models, knowledge, base64_keys).await?,
        Command::Knowledge {
            config,
            query,
            knowledge,
        } => handle_knowledge(config, query, knowledge).await?,
    }
    Ok(())
}

async fn handle_validate(workflow: PathBuf) -> anyhow::Result<()> {
    let report = validate_workflow(&workflow).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn handle_run(
    workflow: PathBuf,
    message: String,
    metadata: Option<String>,
    models: Option<PathBuf>,
    knowledge: Option<PathBuf>,
    base64_keys: bool,
) -> anyhow::Result<()> {
    let metadata = parse_metadata(metadata.as_deref())?;
    let engine = local_engine(models.as_deref(), knowledge.as_deref(), base64_keys).await?;
    let result = run_workflow(&workflow, &message, metadata, &engine).await?;
    engine.shutdown();

    println!("{}", serde_json::to_string_pretty(&result)?);
    if let Some(message) = result.message() {
        anyhow::bail!("workflow run failed: {message}");
    }
    Ok(())
}

async fn handle_knowledge(config: String, query: String, knowledge: PathBuf) -> anyhow::Result<()> {
    let config: Value = serde_json::from_str(&config)?;
    let knowledge = load_knowledge(Some(&knowledge))?;
    let report = test_knowledge_tool(config, &query, knowledge).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
