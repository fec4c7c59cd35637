fn main() {
    ai_env::run_cli();
}
