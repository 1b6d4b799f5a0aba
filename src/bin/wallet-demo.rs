//! Minimal consumer of the wallet gateway.
//!
//! Usage: `wallet-demo [config.toml] [wallets-to-create]`

use futures::StreamExt;
use wallet_db::{logging, GatewayConfig, WalletGateway};

#[tokio::main]
async fn main() -> wallet_db::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    let to_create: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(1);

    let gateway = WalletGateway::new(config);

    // Subscribed before initialization finishes; the gateway buffers until ready.
    let mut changes = gateway.changes();
    if let Some(count) = gateway.count().next().await {
        println!("wallets before: {}", count?);
    }

    for _ in 0..to_create {
        if let Some(created) = gateway.create().next().await {
            let wallet = created?;
            println!("created {} ({})", wallet.name, wallet.id);
            println!("  {}", wallet.convert("hello"));
        }
        if let Some(event) = changes.next().await {
            let event = event?;
            println!("change: {:?} {}", event.operation(), event.id());
        }
    }

    if let Some(wallets) = gateway.list().next().await {
        for wallet in wallets? {
            println!("{:>6}  {:<12} {:<12} {}", wallet.id, wallet.name, wallet.public_key, wallet.secret);
        }
    }

    Ok(())
}
