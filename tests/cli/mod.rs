mod events_test;
mod options_test;
