//! demos/animate_correlations.rs
//!
//! Plays the year-by-year correlation heatmaps of one station, printing each
//! frame as it arrives. Ctrl-C stops the playback.
//!
//! To run this example:
//! cargo run --example animate_correlations -- data 1

use std::error::Error;

use enso_andino::animation::{Direction, FrameContent};
use enso_andino::{Dashboard, Station};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let dashboard = Dashboard::from_data_dir(args.next().unwrap_or_else(|| "data".to_string()));
    let station: Station = args.next().as_deref().unwrap_or("1").parse()?;

    let animation = dashboard.correlation_animation().station(station).call().await?;
    let Some(&start) = animation.years().first() else {
        println!("No years to animate for {}", station);
        return Ok(());
    };

    let token = CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel(4);
    let delay = dashboard.config().animation_delay()?;
    let player = tokio::spawn(async move { animation.play(start, Direction::Forward, delay, token, tx).await });

    while let Some(frame) = rx.recv().await {
        match frame.content {
            FrameContent::Matrix(matrix) => println!("{}\n{}", frame.year, matrix.to_frame()?),
            FrameContent::Warning { message } => println!("{}: {}", frame.year, message),
        }
    }
    println!("{:?}", player.await??);
    Ok(())
}
