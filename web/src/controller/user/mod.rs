pub(crate) mod password_controller;
