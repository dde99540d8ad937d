use crate::event::Event;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// The XKB rule set used to build a keymap, plus the synthetic
/// keyboard's repeat timing. `set_layout` replaces this wholesale.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
  pub rules: String,
  pub model: String,
  pub layout: String,
  pub variant: String,
  pub options: String,
  pub repeat_rate: i32,
  pub repeat_delay: i32,
}

impl Default for KeyboardConfig {
  fn default() -> Self {
    KeyboardConfig {
      rules: String::new(),
      model: String::new(),
      layout: "us".to_string(),
      variant: String::new(),
      options: String::new(),
      repeat_rate: 25,
      repeat_delay: 600,
    }
  }
}

/// The output size the headless backend is brought up with.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
  pub width: u32,
  pub height: u32,
}

impl Default for OutputConfig {
  fn default() -> Self {
    OutputConfig { width: 1920, height: 1080 }
  }
}

#[derive(Default, Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub keyboard: KeyboardConfig,
  pub output: OutputConfig,
}

/// Holds the current [`Config`] and notifies subscribers of changes via
/// a copy-on-write update.
pub struct ConfigManager {
  config: RefCell<Rc<Config>>,
  on_config_changed: Event<Rc<Config>>,
}

impl ConfigManager {
  pub fn new() -> ConfigManager {
    ConfigManager {
      config: RefCell::new(Rc::new(Config::default())),
      on_config_changed: Event::default(),
    }
  }

  pub fn config(&self) -> Rc<Config> {
    self.config.borrow().clone()
  }

  pub fn update_config<F>(&self, updater: F)
  where
    F: FnOnce(&mut Config),
  {
    let mut config = self.config.borrow().clone();
    updater(Rc::make_mut(&mut config));
    *self.config.borrow_mut() = config;
    debug!("ConfigManager::update_config");
    self.on_config_changed.fire(self.config.borrow().clone());
  }

  pub fn on_config_changed(&self) -> &Event<Rc<Config>> {
    &self.on_config_changed
  }
}

impl Default for ConfigManager {
  fn default() -> Self {
    ConfigManager::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_layout_is_us() {
    assert_eq!(Config::default().keyboard.layout, "us");
  }

  #[test]
  fn update_config_fires_change_event_with_new_value() {
    let manager = ConfigManager::new();
    let seen = Rc::new(RefCell::new(None));
    let seen2 = seen.clone();
    manager.on_config_changed().subscribe(Box::new(move |cfg| {
      *seen2.borrow_mut() = Some(cfg.keyboard.layout.clone());
    }));

    manager.update_config(|cfg| cfg.keyboard.layout = "de".to_string());

    assert_eq!(seen.borrow().as_deref(), Some("de"));
    assert_eq!(manager.config().keyboard.layout, "de");
  }
}
