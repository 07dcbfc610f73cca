use clap::Parser;
use owo_colors::OwoColorize;
use spl::checker::TypeChecker;
use spl::cli::{self, Args, Commands, DumpTarget};
use spl::config::{AppConfig, FileConfig};
use spl::diagnostic::{render_diagnostics, Diagnostic};
use spl::interpreter::{self, Builtins};
use spl::lexer;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, Level};

const MAIN_STACK_SIZE: usize = 64 * 1024 * 1024;
const END_OF_INPUT: &str = "ondoka";

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        cli::generate_completions(shell);
        return;
    }

    init_logging(args.verbose);

    let file_config = match &args.config {
        Some(path) => match FileConfig::load(path) {
            Ok(file) => file,
            Err(e) => fail(args.color != cli::ColorChoice::Never, &e.to_string()),
        },
        None => FileConfig::default(),
    };
    let config = AppConfig::from_args(&args, file_config);

    let (source, file_name) = match read_program(&args, &config) {
        Ok(input) => input,
        Err(e) => fail(config.color_enabled, &e),
    };
    debug!(bytes = source.len(), file = %file_name, "program loaded");

    // Deeply nested programs recurse on the host stack.
    let worker = std::thread::Builder::new()
        .name("spl-main".to_string())
        .stack_size(MAIN_STACK_SIZE)
        .spawn(move || run(&args, &config, &source, &file_name));
    let code = match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => 1,
        Err(e) => {
            eprintln!("failed to start interpreter thread: {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args, config: &AppConfig, source: &str, file_name: &str) -> i32 {
    let report = |diagnostics: &[Diagnostic]| {
        eprint!("{}", render_diagnostics(source, file_name, diagnostics, config.color_enabled));
        1
    };

    if let Some(target) = args.dump {
        return match dump(source, target) {
            Ok(json) => {
                let _ = writeln!(io::stdout().lock(), "{}", json);
                0
            }
            Err(diagnostic) => report(&[diagnostic]),
        };
    }

    let builtins = Builtins::standard();

    if args.check_only {
        let checked = lexer::tokenize(source)
            .map_err(spl::Error::from)
            .and_then(|tokens| interpreter::parser::parse(&tokens).map_err(spl::Error::from))
            .and_then(|ast| {
                TypeChecker::with_builtins(&builtins)
                    .check(&ast)
                    .map_err(spl::Error::from)
            });
        return match checked {
            Ok(types) => {
                debug!(statements = types.len(), "type check passed");
                0
            }
            Err(e) => report(&[e.to_diagnostic()]),
        };
    }

    let options = config.run_options(&builtins);
    debug!(?options, "running");
    let result = interpreter::parse_and_run_with_diagnostics(source, &options);
    if let Some(pool) = &options.pool {
        pool.shutdown();
    }
    match result {
        Ok(_) => {
            let _ = io::stdout().flush();
            0
        }
        Err(diagnostics) => report(&diagnostics),
    }
}

fn dump(source: &str, target: DumpTarget) -> Result<String, Diagnostic> {
    let tokens = lexer::tokenize(source).map_err(|e| e.to_diagnostic())?;
    let json = match target {
        DumpTarget::Tokens => serde_json::to_string_pretty(&tokens),
        DumpTarget::Ast => {
            let ast = interpreter::parser::parse(&tokens).map_err(|e| e.to_diagnostic())?;
            serde_json::to_string_pretty(&ast)
        }
    };
    json.map_err(|e| Diagnostic::error(format!("failed to serialize: {}", e)))
}

fn read_program(args: &Args, config: &AppConfig) -> Result<(String, String), String> {
    match &args.file {
        Some(path) => read_file(path).map(|source| (source, path.display().to_string())),
        None => read_stdin(config).map(|source| (source, "<stdin>".to_string())),
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("spl") {
        return Err(format!("Expected a .spl file: {}", path.display()));
    }
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn read_stdin(config: &AppConfig) -> Result<String, String> {
    let interactive = atty::is(atty::Stream::Stdin);
    if interactive && config.verbose == 0 {
        println!("SPL {}", env!("CARGO_PKG_VERSION"));
        println!("Type a program. End with `{}` on its own line or Ctrl+D.", END_OF_INPUT);
    }

    let mut program = String::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("spl> ");
            let _ = io::stdout().flush();
        }
        match lines.next() {
            None => break,
            Some(Ok(line)) => {
                if line.trim() == END_OF_INPUT {
                    break;
                }
                program.push_str(&line);
                program.push('\n');
            }
            Some(Err(e)) => return Err(format!("Error reading input: {}", e)),
        }
    }
    Ok(program)
}

fn fail(color: bool, message: &str) -> ! {
    if color {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
    std::process::exit(1);
}
