mod bus_commands;
mod focus_servo;
mod harness;
mod payload_properties;
mod rotary_sequence;
mod startup;
