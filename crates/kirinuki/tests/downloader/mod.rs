mod failure;
mod ordering;
mod progress;
