fn main() {
    marker_pipeline::cli::run();
}
