mod services;

pub use services::{
    content_type_for, ImageAcquisition, ImageFile, ImagePicker, ImageSource, PickRequest,
    PickerFailure,
};

#[cfg(test)]
pub(crate) use services::fake;
