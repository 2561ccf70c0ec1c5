pub mod email;
pub mod get_record_id;
pub mod jwt;
pub mod pwd;
pub mod token;
pub mod validated_form;
