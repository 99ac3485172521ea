mod matrix;
mod view;
