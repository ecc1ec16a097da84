use env_logger::Env;

/// 初始化 logger，預設等級可由 `RUST_LOG` 覆寫
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init()
        .ok();
}
