//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements                      | Connects to              |
//! |--------------|---------------------------------|--------------------------|
//! | `gpio`       | LineWiring, InputPin/OutputPin  | ESP32 GPIO + edge ISRs   |
//! | `esp_timer`  | TimerService                    | esp_timer one-shots      |
//! | `runtime`    | DiagnosticSink                  | ISR queue + task notify  |
//! | `log_sink`   | DiagnosticSink                  | Serial log output        |
//! | `sim`        | all of the above                | Host memory (tests)      |

pub mod log_sink;

#[cfg(target_os = "espidf")]
pub mod esp_timer;
#[cfg(target_os = "espidf")]
pub mod gpio;
#[cfg(target_os = "espidf")]
pub mod runtime;

#[cfg(not(target_os = "espidf"))]
pub mod sim;
