use std::error::Error;
use std::path::Path;

use crate::cli::require_api_key;
use crate::core::config::Config;
use crate::speech::{SpeechClient, SpeechModel};

pub async fn run(config: &Config, text: &str, output: &Path) -> Result<(), Box<dyn Error>> {
    let api_key = require_api_key(config)?;
    let speech = SpeechClient::new(
        reqwest::Client::new(),
        config.base_url(),
        api_key,
        config.speech_model(),
        config.voice(),
    );

    match speech.synthesize(text).await? {
        Some(clip) => {
            clip.write_wav(output)?;
            println!(
                "Wrote {} ({:.1}s at {} Hz)",
                output.display(),
                clip.duration_secs(),
                clip.sample_rate
            );
        }
        None => println!("The speech service returned no audio."),
    }
    Ok(())
}
