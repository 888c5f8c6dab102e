use anyhow::Context;
use mockkit_core::config::MockkitConfig;
use mockkit_gen::{Generator, Options, Output};
use mockkit_parsers::Resolver;

use super::EXIT_FAILURE;
use crate::cli_args::GenArgs;

/// Run `mockkit gen`: render one mock and write it.
pub fn run(args: GenArgs) -> i32 {
    match generate(args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("mockkit gen: {e:#}");
            EXIT_FAILURE
        }
    }
}

fn generate(args: GenArgs) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let config = MockkitConfig::load(&cwd);
    let opts = options(args, &config);

    let mut generator = Generator::new(Resolver::new(&cwd));
    let output = generator
        .run(&opts)
        .with_context(|| format!("failed to generate a mock for trait {}", opts.trait_name))?;
    if let Output::File(path) = output {
        println!("{}", path.display());
    }
    Ok(())
}

/// Command-line flags layered over the `generator` section of the config.
fn options(args: GenArgs, config: &MockkitConfig) -> Options {
    let defaults = &config.generator;
    Options {
        mock_name: args.name,
        output: args.output,
        on_helpers: args.on_helpers || defaults.on_helpers,
        variadic_slices: args.variadic_slices || defaults.variadic_slices,
        tester_alias: args.tester_alias.or_else(|| defaults.tester_alias.clone()),
        ..Options::with_config(args.src, args.dst, args.trait_name, defaults)
    }
}
