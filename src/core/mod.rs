pub mod intake;
pub mod model_output;

pub use crate::domain::model::{AddressPair, BookingReceipt, Distance, LabelImage, PartyAddress};
pub use crate::domain::ports::{DistanceProvider, FormFiller, LabelExtractor};
pub use crate::utils::error::Result;
pub use intake::{LabelIntake, PipelineStage, StageFailure};
