// Copyright 2024 The Smartlog Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! User-tunable knobs, loaded from TOML by the embedding shell.

/// Typed access to the model's configuration with built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    config: config::Config,
}

impl UserSettings {
    /// Wraps an already-loaded configuration.
    pub fn from_config(config: config::Config) -> Self {
        UserSettings { config }
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Ok(UserSettings { config })
    }

    /// How many commands may sit in the queue waiting behind the running
    /// one.
    pub fn max_queued_commands(&self) -> usize {
        self.config
            .get_int("ui.max-queued-commands")
            .map(|value| value as usize)
            .unwrap_or(16)
    }

    /// How many output lines are retained per queue entry for error
    /// banners.
    pub fn command_output_limit(&self) -> usize {
        self.config
            .get_int("ui.command-output-limit")
            .map(|value| value as usize)
            .unwrap_or(200)
    }

    /// The underlying configuration.
    pub fn config(&self) -> &config::Config {
        &self.config
    }
}
