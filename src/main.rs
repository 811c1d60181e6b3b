use anyhow::Result;
use despachos::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析参数
    let args = cli::parse_args(std::env::args().skip(1))?;

    // 运行命令
    cli::run(args).await
}
