//! seqgen binary entry point.

use seqgen::ui::output;

fn main() {
    if let Err(e) = seqgen::cli::run() {
        output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
