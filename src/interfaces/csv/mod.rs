pub mod tutor_writer;
