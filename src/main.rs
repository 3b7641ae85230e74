fn main() {
    env_logger::init();

    if let Err(e) = hello_glyphs::app::App::run() {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
