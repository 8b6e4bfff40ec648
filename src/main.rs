#[tokio::main]
async fn main() {
    if let Err(e) = clinic_admin::run().await {
        tracing::error!("{e}");
        eprintln!("clinic-admin: {e}");
        std::process::exit(1);
    }
}
