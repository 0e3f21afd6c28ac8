pub type CmdResult<T> = importmap::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod fix_imports;
pub mod install;
pub mod pins;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (importmap::Result<serde_json::Value>, i32) {
    crate::tty::status("importmap is working...");

    match command {
        crate::Commands::Install(args) => dispatch!(args, global, install),
        crate::Commands::FixImports(args) => dispatch!(args, global, fix_imports),
        crate::Commands::Pins(args) => dispatch!(args, global, pins),
    }
}
