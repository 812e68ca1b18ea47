// Adapters layer: concrete clients for the external services behind the domain ports.

pub mod booking_form;
pub mod distance_matrix;
pub mod gemini;
pub mod webdriver;

pub use booking_form::BookingFormFiller;
pub use distance_matrix::DistanceMatrixClient;
pub use gemini::{GeminiClient, GeminiDistanceEstimator, GeminiLabelExtractor};
pub use webdriver::{WebDriverClient, WebDriverSession};
