pub mod country_writer;
