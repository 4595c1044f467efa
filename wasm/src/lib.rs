use minesweeper_ai as ms;
use wasm_bindgen::prelude::*;

fn load(bts: &[u8]) -> Result<ms::Game, String> {
    ms::Game::deserialize(bts).map_err(|e| e.to_string())
}

fn store(game: &ms::Game) -> Result<Vec<u8>, String> {
    game.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn create_game(height: u8, width: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let game = ms::Game::random(
        height as usize,
        width as usize,
        mines as usize,
        &mut rand::rng(),
    )
    .map_err(|e| e.to_string())?;
    store(&game)
}

#[wasm_bindgen]
pub fn validate(bts: Vec<u8>) -> Result<bool, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game.check_win_condition())
}

/// Reveals a cell. The returned bytes carry the new game state followed by
/// one status byte: 0 while playing, 1 on a loss, 2 on a win.
#[wasm_bindgen]
pub fn reveal(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.reveal(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    with_status(&game)
}

/// Lets the AI play one move; same output layout as [`reveal`].
#[wasm_bindgen]
pub fn ai_step(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.ai_step(&mut rand::rng()).map_err(|e| e.to_string())?;
    with_status(&game)
}

#[wasm_bindgen]
pub fn toggle_flag(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    game.toggle_flag(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    store(&game)
}

/// Row-major tiles: -1 hidden, -2 flagged, otherwise the nearby mine count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game
        .tiles()
        .iter()
        .enumerate()
        .flat_map(|(row, tiles)| {
            let game = &game;
            tiles.iter().enumerate().map(move |(col, tile)| match tile {
                ms::Tile::Hidden if game.flags().contains(&ms::Cell::new(row, col)) => -2,
                ms::Tile::Hidden => -1,
                ms::Tile::Revealed(n) => *n as i8,
            })
        })
        .collect())
}

fn with_status(game: &ms::Game) -> Result<Vec<u8>, String> {
    let mut xs = store(game)?;
    xs.push(match game.state() {
        ms::GameState::Playing => 0,
        ms::GameState::Lost => 1,
        ms::GameState::Won => 2,
    });
    Ok(xs)
}
