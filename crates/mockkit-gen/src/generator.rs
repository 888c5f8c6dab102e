//! One generation run: resolve, parse, render, write.

use std::io::Write;
use std::path::{Path, PathBuf};

use mockkit_core::config::{GeneratorConfig, MockSpec};
use mockkit_parsers::{parse_interface, GenError, ParseOptions, Resolver};

use crate::emit::{emit, EmitOptions};

/// What to generate and how.
#[derive(Debug, Clone)]
pub struct Options {
    /// Module holding the trait: a path or a module path.
    pub src: String,
    /// Module the mock belongs to. The mock is written as a child module of
    /// it.
    pub dst: String,
    pub trait_name: String,
    /// Defaults to `<Trait>Mock`.
    pub mock_name: Option<String>,
    /// Output file, `-` for stdout. Relative paths are taken from the
    /// resolver's working directory.
    pub output: Option<PathBuf>,
    pub on_helpers: bool,
    pub variadic_slices: bool,
    pub runtime_crate: String,
    pub tester_path: String,
    pub tester_alias: Option<String>,
}

impl Options {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, trait_name: impl Into<String>) -> Self {
        Self::with_config(src, dst, trait_name, &GeneratorConfig::default())
    }

    pub fn with_config(
        src: impl Into<String>,
        dst: impl Into<String>,
        trait_name: impl Into<String>,
        cfg: &GeneratorConfig,
    ) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            trait_name: trait_name.into(),
            mock_name: None,
            output: None,
            on_helpers: cfg.on_helpers,
            variadic_slices: cfg.variadic_slices,
            runtime_crate: cfg.runtime_crate.clone(),
            tester_path: cfg.tester_path.clone(),
            tester_alias: cfg.tester_alias.clone(),
        }
    }

    /// Options for one entry of a batch config.
    pub fn from_spec(spec: &MockSpec, cfg: &GeneratorConfig) -> Self {
        Self {
            mock_name: spec.name.clone(),
            output: spec.output.clone(),
            on_helpers: spec.on_helpers(cfg),
            ..Self::with_config(&spec.src, &spec.dst, &spec.trait_name, cfg)
        }
    }

    pub fn mock_name(&self) -> String {
        self.mock_name
            .clone()
            .unwrap_or_else(|| format!("{}Mock", self.trait_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

/// Rendered mock source and where it goes.
#[derive(Debug, Clone)]
pub struct Generated {
    pub mock_name: String,
    pub source: String,
    pub output: Output,
}

impl Generated {
    /// Writes the source to its file, creating parent directories, or to
    /// stdout.
    pub fn write(&self) -> Result<(), GenError> {
        match &self.output {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(self.source.as_bytes())
                    .map_err(|source| GenError::Io {
                        path: PathBuf::from("-"),
                        source,
                    })
            }
            Output::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| GenError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(path, &self.source).map_err(|source| GenError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::info!(mock = %self.mock_name, path = %path.display(), "wrote mock");
                Ok(())
            }
        }
    }
}

/// Runs generations sharing one package cache.
pub struct Generator {
    resolver: Resolver,
}

impl Generator {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// Renders the mock described by `opts` without writing it.
    pub fn generate(&mut self, opts: &Options) -> Result<Generated, GenError> {
        let src = self.resolver.resolve(&opts.src)?;
        let dst = self.resolver.resolve(&opts.dst)?;
        let parse_opts = ParseOptions {
            variadic_slices: opts.variadic_slices,
        };
        let iface = parse_interface(&mut self.resolver, &src, &dst, &opts.trait_name, &parse_opts)?;

        let mock_name = opts.mock_name();
        let source = emit(
            &iface,
            &EmitOptions {
                mock_name: mock_name.clone(),
                on_helpers: opts.on_helpers,
                runtime_crate: opts.runtime_crate.clone(),
                tester_path: opts.tester_path.clone(),
                tester_alias: opts.tester_alias.clone(),
            },
        )?;
        let output = match &opts.output {
            Some(p) if p == Path::new("-") => Output::Stdout,
            Some(p) => Output::File(self.resolver.cwd().join(p)),
            None => Output::File(dst.child_dir().join(format!("{}.rs", snake_case(&mock_name)))),
        };
        tracing::debug!(
            trait_name = %opts.trait_name,
            mock = %mock_name,
            src = %src.spec,
            dst = %dst.spec,
            methods = iface.methods.len(),
            "generated mock"
        );
        Ok(Generated {
            mock_name,
            source,
            output,
        })
    }

    /// Generates and writes.
    pub fn run(&mut self, opts: &Options) -> Result<Output, GenError> {
        let generated = self.generate(opts)?;
        generated.write()?;
        Ok(generated.output)
    }
}

/// `StoreMock` -> `store_mock`, `HTTPClientMock` -> `http_client_mock`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
