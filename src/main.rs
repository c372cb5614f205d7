fn main() {
    pomcrawl::cli::run();
}
