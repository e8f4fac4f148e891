#[tokio::main]
async fn main() {
    if let Err(e) = clinic_server::run().await {
        eprintln!("clinic-server: {e}");
        std::process::exit(1);
    }
}
