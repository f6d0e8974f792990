#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = compose_export::run().await {
        eprintln!("compose-export: {}", e);
        std::process::exit(1);
    }
}
