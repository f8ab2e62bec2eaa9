pub mod flashcard;
