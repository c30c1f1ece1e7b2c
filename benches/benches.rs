use std::hint::black_box;
use std::io;

use criterion::{criterion_group, criterion_main, Criterion};
use pgn_tree::{parse_pgn, write_pgn};

static GAME: &str = r#"[Event "FIDE Women's World Cup"]
[Site "Batumi GEO"]
[Date "2025.07.08"]
[Round "1.3"]
[White "Miranda Rodriguez,T"]
[Black "Kulon,K"]
[Result "0-1"]
[WhiteTitle "WIM"]
[BlackTitle "IM"]
[WhiteElo "2007"]
[BlackElo "2406"]
[ECO "C42"]
[Opening "Petrov"]
[Variation "Damiano variation"]
[WhiteFideId "3510417"]
[BlackFideId "1131044"]
[EventDate "2025.07.06"]
[EventType "k.o."]

1. e4 e5 2. Nf3 Nf6 3. Nxe5 Nxe4 4. Qe2 Qe7 5. Qxe4 d6 6. d4 dxe5 7. dxe5 Nc6 8.
Nc3 Qxe5 9. Qxe5+ Nxe5 10. Nb5 Bb4+ 11. Bd2 Bxd2+ 12. Kxd2 Kd8 13. Rd1 Bd7 14.
Be2 a6 15. Nc3 c6 16. Kc1 Kc7 17. f4 Ng6 18. g3 Rhe8 19. Rhe1 Re7 20. Bf3 Rae8
21. Rxe7 Rxe7 22. Ne4 f6 23. Rd4 Nh8 24. c4 Nf7 25. c5 Be6 26. a3 Bd5 27. Kd2
Nh6 28. Kd3 Nf5 29. Rb4 a5 30. Ra4 b6 31. cxb6+ Kxb6 32. Bg4 Bb3 33. Nc3 Nh6 34.
Bd1 Rd7+ 35. Rd4 Rxd4+ 36. Kxd4 Nf5+ 37. Kd3 Bxd1 38. Nxd1 Kc5 39. Nc3 h5 40.
Ne4+ Kd5 41. Nd2 Nd6 42. b3 f5 43. Nf3 Ne4 44. Nh4 Nd6 45. Nf3 Ne4 46. Nh4 Nc5+
47. Kc3 Ke4 48. Kc4 Ne6 49. b4 axb4 50. Kxb4 Kd3 51. a4 c5+ 52. Kb5 c4 53. a5 c3
54. a6 Nc7+ 55. Kb6 Nxa6 56. Nf3 Nb4 57. Kb5 c2 58. Ne1+ Ke4 59. Nxc2 Nxc2 60.
Kc4 Ne3+ 0-1
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_game", |b| {
        b.iter(|| {
            let mut parser = parse_pgn(io::Cursor::new(black_box(GAME)));
            parser.read_game().expect("ok").expect("game")
        })
    });
}

fn bench_write(c: &mut Criterion) {
    let mut parser = parse_pgn(io::Cursor::new(GAME));
    let game = parser.read_game().expect("ok").expect("game");
    c.bench_function("write_game", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(2048);
            write_pgn(black_box(&game), &mut out).expect("write ok");
            out
        })
    });
}

criterion_group!(benches, bench_parse, bench_write);
criterion_main!(benches);
